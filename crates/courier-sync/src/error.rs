use courier_shared::Failure;
use courier_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Local storage failed; the batch was rolled back
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Fetch or account lookup failed; already classified and notified
    #[error("Remote error: {0}")]
    Remote(Failure),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("Database lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, SyncError>;
