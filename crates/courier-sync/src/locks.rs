use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per owner id.
///
/// Syncs for the same owner run one at a time; different owners never wait
/// on each other.
#[derive(Debug, Default)]
pub struct OwnerLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl OwnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, owner_id: &str) -> OwnedMutexGuard<()> {
        let lock = self.entry(owner_id);
        lock.lock_owned().await
    }

    fn entry(&self, owner_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(owner_id.to_string()).or_default())
    }
}
