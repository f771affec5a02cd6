//! Account lookup and the per-realm failure handling capability.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use courier_shared::{EntityAware, Failure, User};

/// Realm-specific failure handling, looked up through the account.
pub trait ErrorHandler: Send + Sync {
    /// `true` when the realm already dealt with `failure` (reconnected,
    /// refreshed a token, ...) and nothing should be shown to the user.
    fn handle_failure(&self, failure: &Failure, account: &Account) -> bool;
}

/// Realm that never handles anything itself
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughRealm;

impl ErrorHandler for PassthroughRealm {
    fn handle_failure(&self, _failure: &Failure, _account: &Account) -> bool {
        false
    }
}

/// A configured remote account and the local user it syncs for.
#[derive(Clone)]
pub struct Account {
    id: String,
    user: User,
    online: bool,
    realm: Arc<dyn ErrorHandler>,
}

impl Account {
    pub fn new(id: impl Into<String>, user: User, realm: Arc<dyn ErrorHandler>) -> Self {
        Self {
            id: id.into(),
            user,
            online: true,
            realm,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owner of everything synced through this account
    pub fn user(&self) -> &User {
        &self.user
    }

    /// `false` once the connection was stopped on purpose
    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn realm(&self) -> &dyn ErrorHandler {
        self.realm.as_ref()
    }

    pub fn with_online(&self, online: bool) -> Self {
        Self {
            online,
            ..self.clone()
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("user", &self.user.entity().entity_id())
            .field("online", &self.online)
            .finish_non_exhaustive()
    }
}

pub trait AccountService: Send + Sync {
    /// Fails with `UnsupportedAccount` when no account has this id.
    fn account_by_id(&self, account_id: &str) -> Result<Account, Failure>;
}

/// In-process account table.
#[derive(Default)]
pub struct AccountRegistry {
    accounts: RwLock<HashMap<String, Account>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, account: Account) {
        tracing::info!(account_id = %account.id(), "account registered");
        if let Ok(mut accounts) = self.accounts.write() {
            accounts.insert(account.id().to_string(), account);
        }
    }

    /// Returns `false` for unknown accounts
    pub fn set_online(&self, account_id: &str, online: bool) -> bool {
        let Ok(mut accounts) = self.accounts.write() else {
            return false;
        };
        match accounts.get_mut(account_id) {
            Some(account) => {
                account.online = online;
                tracing::debug!(account_id, online, "account connection state changed");
                true
            }
            None => false,
        }
    }
}

impl AccountService for AccountRegistry {
    fn account_by_id(&self, account_id: &str) -> Result<Account, Failure> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| Failure::unclassified("account registry lock poisoned"))?;
        accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| Failure::unsupported_account(account_id))
    }
}
