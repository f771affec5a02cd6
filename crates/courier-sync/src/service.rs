//! Account sync: fetch remote state, reconcile it with the local store.
//!
//! A sync for one owner runs under that owner's lock, so reading the local
//! links, diffing and applying the batch never interleave with another sync
//! for the same owner. The store work runs on a blocking worker while the
//! database guard is held.

use std::future::Future;
use std::sync::{Arc, Mutex};

use courier_shared::{ApiChat, EntityAware, Failure, User};
use courier_store::{Database, MergePolicy, MergeResult};

use crate::accounts::{Account, AccountService};
use crate::error::{Result, SyncError};
use crate::exception::ExceptionHandler;
use crate::locks::OwnerLocks;

/// Fetches an account's remote state. Implemented per transport.
pub trait RemoteSource: Send + Sync {
    fn fetch_user_chats(
        &self,
        account: &Account,
    ) -> impl Future<Output = std::result::Result<Vec<ApiChat>, Failure>> + Send;

    fn fetch_user_contacts(
        &self,
        account: &Account,
    ) -> impl Future<Output = std::result::Result<Vec<User>, Failure>> + Send;
}

pub struct SyncService<R> {
    db: Arc<Mutex<Database>>,
    remote: R,
    accounts: Arc<dyn AccountService>,
    exceptions: Arc<ExceptionHandler>,
    locks: OwnerLocks,
}

impl<R: RemoteSource> SyncService<R> {
    pub fn new(
        db: Database,
        remote: R,
        accounts: Arc<dyn AccountService>,
        exceptions: Arc<ExceptionHandler>,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            remote,
            accounts,
            exceptions,
            locks: OwnerLocks::new(),
        }
    }

    /// Shared database handle, for reads outside a sync
    pub fn database(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }

    /// Fetch the account's chats and merge them for the account's user.
    pub async fn sync_user_chats(&self, account_id: &str, policy: MergePolicy) -> Result<MergeResult<ApiChat>> {
        let account = self.account(account_id)?;
        let owner_id = account.user().entity_id().to_string();
        let _guard = self.locks.lock(&owner_id).await;

        let chats = self
            .remote
            .fetch_user_chats(&account)
            .await
            .map_err(|failure| self.remote_failure(failure))?;
        tracing::debug!(account_id, owner_id = %owner_id, fetched = chats.len(), "user chats fetched");

        self.run_blocking(move |db| db.merge_user_chats(&owner_id, chats, policy))
            .await
    }

    /// Fetch the account's contacts and merge them for the account's user.
    pub async fn sync_user_contacts(&self, account_id: &str, policy: MergePolicy) -> Result<MergeResult<User>> {
        let account = self.account(account_id)?;
        let owner_id = account.user().entity_id().to_string();
        let _guard = self.locks.lock(&owner_id).await;

        let contacts = self
            .remote
            .fetch_user_contacts(&account)
            .await
            .map_err(|failure| self.remote_failure(failure))?;
        tracing::debug!(account_id, owner_id = %owner_id, fetched = contacts.len(), "user contacts fetched");

        self.run_blocking(move |db| db.merge_user_contacts(&owner_id, contacts, policy))
            .await
    }

    /// Merge an already fetched batch of chats for `owner_id`.
    pub async fn merge_user_chats(
        &self,
        owner_id: &str,
        chats: Vec<ApiChat>,
        policy: MergePolicy,
    ) -> Result<MergeResult<ApiChat>> {
        let _guard = self.locks.lock(owner_id).await;
        let owner_id = owner_id.to_string();
        self.run_blocking(move |db| db.merge_user_chats(&owner_id, chats, policy))
            .await
    }

    /// Merge an already fetched batch of contacts for `owner_id`.
    pub async fn merge_user_contacts(
        &self,
        owner_id: &str,
        contacts: Vec<User>,
        policy: MergePolicy,
    ) -> Result<MergeResult<User>> {
        let _guard = self.locks.lock(owner_id).await;
        let owner_id = owner_id.to_string();
        self.run_blocking(move |db| db.merge_user_contacts(&owner_id, contacts, policy))
            .await
    }

    fn account(&self, account_id: &str) -> Result<Account> {
        self.accounts
            .account_by_id(account_id)
            .map_err(|failure| self.remote_failure(failure))
    }

    fn remote_failure(&self, failure: Failure) -> SyncError {
        self.exceptions.handle(&failure);
        SyncError::Remote(failure)
    }

    async fn run_blocking<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> courier_store::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let outcome = tokio::task::spawn_blocking(move || {
            let mut db = db.lock().map_err(|_| SyncError::Poisoned)?;
            job(&mut *db).map_err(SyncError::Store)
        })
        .await
        .map_err(|e| SyncError::Worker(e.to_string()))?;

        if let Err(SyncError::Store(e)) = &outcome {
            tracing::error!(error = %e, "merge aborted, batch rolled back");
        }
        outcome
    }
}
