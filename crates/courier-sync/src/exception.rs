//! Failure classification and recovery.
//!
//! [`ExceptionHandler::classify`] is a single step over the failure kind. A
//! step either settles on an [`Action`] or delegates to another failure (a
//! nested cause, or the account failure carried by a runtime wrapper).
//! [`ExceptionHandler::handle`] follows delegations until an action is
//! settled, logs the failure and forwards the matching notification.
//!
//! Delegation only ever moves to a distinct cause further down the chain, so
//! handling is bounded by the chain length; a cause that is the failure
//! itself is never followed.

use std::sync::Arc;

use courier_shared::{Failure, FailureKind};

use crate::accounts::AccountService;
use crate::network::{NetworkState, NetworkStateService};
use crate::notifications::{Notification, NotificationKind, NotificationSink};

#[derive(Debug, Clone)]
pub enum Action {
    Suppress,
    /// Classify this failure instead
    Delegate(Failure),
    NotifyAccountError,
    NotifyConnectionError,
    NotifyUnsupportedAccount,
    NotifyNoInternet,
    NotifyInvalidResponse,
    NotifyUndefined,
}

impl Action {
    pub fn notification_kind(&self) -> Option<NotificationKind> {
        match self {
            Self::Suppress | Self::Delegate(_) => None,
            Self::NotifyAccountError => Some(NotificationKind::AccountError),
            Self::NotifyConnectionError => Some(NotificationKind::ConnectionError),
            Self::NotifyUnsupportedAccount => Some(NotificationKind::UnsupportedAccount),
            Self::NotifyNoInternet => Some(NotificationKind::NoInternet),
            Self::NotifyInvalidResponse => Some(NotificationKind::InvalidResponse),
            Self::NotifyUndefined => Some(NotificationKind::UndefinedError),
        }
    }

    pub fn is_suppress(&self) -> bool {
        matches!(self, Self::Suppress)
    }
}

pub struct ExceptionHandler {
    accounts: Arc<dyn AccountService>,
    network: Arc<dyn NetworkStateService>,
    notifications: Arc<dyn NotificationSink>,
}

impl ExceptionHandler {
    pub fn new(
        accounts: Arc<dyn AccountService>,
        network: Arc<dyn NetworkStateService>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            accounts,
            network,
            notifications,
        }
    }

    /// Classify, log and notify. Returns the settled action, never `Delegate`.
    pub fn handle(&self, failure: &Failure) -> Action {
        let mut current = failure.clone();
        loop {
            match self.classify(&current) {
                Action::Delegate(next) => {
                    tracing::trace!(from = %current, to = %next, "delegating failure");
                    current = next;
                }
                action => {
                    tracing::error!(
                        error = %current,
                        kind = ?current.kind(),
                        action = ?action,
                        "failure handled"
                    );
                    if let Some(kind) = action.notification_kind() {
                        self.notifications
                            .add(Notification::new(kind).caused_by(current));
                    }
                    return action;
                }
            }
        }
    }

    /// One classification step, no logging and no notification
    pub fn classify(&self, failure: &Failure) -> Action {
        match failure.kind() {
            FailureKind::UnsupportedAccount { .. } => Action::NotifyUnsupportedAccount,
            // already surfaced by whoever stopped the account
            FailureKind::AccountDisconnected { .. } => Action::Suppress,
            FailureKind::AccountConnection { .. } => self.classify_connection(failure),
            FailureKind::Account { .. } => self.classify_account(failure),
            FailureKind::TransportIo => Action::NotifyNoInternet,
            FailureKind::MalformedResponse => Action::NotifyInvalidResponse,
            FailureKind::AccountRuntime { account_id } => {
                let carried = failure.distinct_cause().cloned().unwrap_or_else(|| failure.clone());
                Action::Delegate(
                    Failure::account(account_id.clone(), failure.message()).caused_by(carried),
                )
            }
            FailureKind::Io | FailureKind::Storage | FailureKind::Unclassified => {
                Action::NotifyUndefined
            }
        }
    }

    fn classify_connection(&self, failure: &Failure) -> Action {
        if self.delegate_to_realm(failure) {
            return Action::Suppress;
        }

        if let Some(cause) = failure
            .distinct_cause()
            .filter(|cause| matches!(cause.kind(), FailureKind::AccountConnection { .. }))
        {
            return Action::Delegate(cause.clone());
        }

        match self.network.network_state() {
            // connected but flaky: do not nag
            NetworkState::Connected if is_internet_failure(failure) => Action::Suppress,
            NetworkState::Connected => Action::NotifyConnectionError,
            NetworkState::Disconnected => Action::Suppress,
        }
    }

    fn classify_account(&self, failure: &Failure) -> Action {
        if self.delegate_to_realm(failure) {
            return Action::Suppress;
        }

        match failure.distinct_cause().filter(|cause| cause.kind().is_account()) {
            Some(cause) => Action::Delegate(cause.clone()),
            None => Action::NotifyAccountError,
        }
    }

    /// Ask the owning account's realm whether it already dealt with the
    /// failure. An account that is offline counts as handled.
    fn delegate_to_realm(&self, failure: &Failure) -> bool {
        let Some(account_id) = failure.account_id() else {
            return false;
        };

        let account = match self.accounts.account_by_id(account_id) {
            Ok(account) => account,
            Err(e) => {
                tracing::error!(account_id, error = %e, "account lookup failed during failure handling");
                return false;
            }
        };

        let target = failure.distinct_cause().unwrap_or(failure);
        account.realm().handle_failure(target, &account) || !account.is_online()
    }
}

/// Whether the failure or any failure in its cause chain is a low-level I/O
/// failure
pub fn is_internet_failure(failure: &Failure) -> bool {
    failure.chain().any(|f| *f.kind() == FailureKind::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use courier_shared::{Entity, User};

    use crate::accounts::{Account, AccountRegistry, ErrorHandler, PassthroughRealm};
    use crate::network::SharedNetworkState;
    use crate::notifications::NotificationService;

    const ACCOUNT: &str = "test~0";

    /// Realm that records what it was asked about
    #[derive(Default)]
    struct RecordingRealm {
        handles: bool,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl ErrorHandler for RecordingRealm {
        fn handle_failure(&self, failure: &Failure, _account: &Account) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(failure.message().to_string());
            }
            self.handles
        }
    }

    struct Fixture {
        accounts: Arc<AccountRegistry>,
        network: Arc<SharedNetworkState>,
        notifications: Arc<NotificationService>,
        handler: ExceptionHandler,
    }

    fn fixture(realm: Arc<dyn ErrorHandler>) -> Fixture {
        let accounts = Arc::new(AccountRegistry::new());
        let user = User::new_empty(Entity::new(ACCOUNT, "me")).freeze();
        accounts.register(Account::new(ACCOUNT, user, realm));

        let network = Arc::new(SharedNetworkState::new(NetworkState::Connected));
        let notifications = Arc::new(NotificationService::new());
        let handler = ExceptionHandler::new(accounts.clone(), network.clone(), notifications.clone());
        Fixture {
            accounts,
            network,
            notifications,
            handler,
        }
    }

    fn passthrough() -> Fixture {
        fixture(Arc::new(PassthroughRealm))
    }

    fn kinds(notifications: &NotificationService) -> Vec<NotificationKind> {
        notifications.drain().iter().map(|n| n.kind()).collect()
    }

    #[test]
    fn test_unsupported_account_notifies() {
        let f = passthrough();
        let action = f.handler.handle(&Failure::unsupported_account("vk~3"));
        assert!(matches!(action, Action::NotifyUnsupportedAccount));
        assert_eq!(kinds(&f.notifications), [NotificationKind::UnsupportedAccount]);
    }

    #[test]
    fn test_disconnected_account_is_silent() {
        let f = passthrough();
        let action = f.handler.handle(&Failure::account_disconnected(ACCOUNT));
        assert!(action.is_suppress());
        assert!(f.notifications.is_empty());
    }

    #[test]
    fn test_connection_error_when_connected() {
        let f = passthrough();
        let failure = Failure::account_connection(ACCOUNT, "handshake rejected");
        let action = f.handler.handle(&failure);

        assert!(matches!(action, Action::NotifyConnectionError));
        let notes = f.notifications.drain();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].cause().unwrap().is_same(&failure));
    }

    #[test]
    fn test_connection_error_when_disconnected() {
        let f = passthrough();
        f.network.set(NetworkState::Disconnected);
        let action = f.handler.handle(&Failure::account_connection(ACCOUNT, "timeout"));
        assert!(action.is_suppress());
        assert!(f.notifications.is_empty());
    }

    #[test]
    fn test_connection_error_over_flaky_link() {
        let f = passthrough();
        let failure = Failure::account_connection(ACCOUNT, "sync failed")
            .caused_by(Failure::transport_io("request failed").caused_by(Failure::io("reset by peer")));

        assert!(f.handler.handle(&failure).is_suppress());
        assert!(f.notifications.is_empty());
    }

    #[test]
    fn test_self_referential_connection_error_terminates() {
        let f = passthrough();
        let inner = Failure::account_connection(ACCOUNT, "loop");
        let failure = inner.clone().caused_by(inner);

        assert!(matches!(f.handler.classify(&failure), Action::NotifyConnectionError));
        assert!(matches!(f.handler.handle(&failure), Action::NotifyConnectionError));

        f.network.set(NetworkState::Disconnected);
        assert!(f.handler.handle(&failure).is_suppress());
    }

    #[test]
    fn test_nested_connection_error_is_followed() {
        let f = passthrough();
        let root = Failure::account_connection(ACCOUNT, "root");
        let failure = Failure::account_connection(ACCOUNT, "outer").caused_by(root.clone());

        match f.handler.classify(&failure) {
            Action::Delegate(next) => assert!(next.is_same(&root)),
            other => panic!("expected delegation, got {other:?}"),
        }

        f.handler.handle(&failure);
        let notes = f.notifications.drain();
        assert!(notes[0].cause().unwrap().is_same(&root));
    }

    #[test]
    fn test_realm_handles_connection_error() {
        let realm = Arc::new(RecordingRealm {
            handles: true,
            ..Default::default()
        });
        let f = fixture(realm.clone());

        let failure = Failure::account_connection(ACCOUNT, "outer")
            .caused_by(Failure::transport_io("inner"));
        assert!(f.handler.handle(&failure).is_suppress());
        assert!(f.notifications.is_empty());

        // the realm is shown the cause, not the wrapper
        assert_eq!(realm.seen.lock().unwrap().as_slice(), ["inner"]);
    }

    #[test]
    fn test_realm_sees_failure_without_cause() {
        let realm = Arc::new(RecordingRealm::default());
        let f = fixture(realm.clone());

        f.handler.handle(&Failure::account(ACCOUNT, "bare"));
        assert_eq!(realm.seen.lock().unwrap().as_slice(), ["bare"]);
    }

    #[test]
    fn test_offline_account_counts_as_handled() {
        let f = passthrough();
        f.accounts.set_online(ACCOUNT, false);

        assert!(f.handler.handle(&Failure::account(ACCOUNT, "stopped")).is_suppress());
        assert!(f.handler.handle(&Failure::account_connection(ACCOUNT, "stopped")).is_suppress());
        assert!(f.notifications.is_empty());
    }

    #[test]
    fn test_unknown_account_is_not_handled() {
        let f = passthrough();
        let action = f.handler.handle(&Failure::account("vk~7", "token expired"));
        assert!(matches!(action, Action::NotifyAccountError));
    }

    #[test]
    fn test_account_error_follows_account_cause() {
        let realm = Arc::new(RecordingRealm::default());
        let f = fixture(realm.clone());

        let root = Failure::account(ACCOUNT, "root");
        let failure = Failure::account(ACCOUNT, "outer").caused_by(root.clone());
        assert!(matches!(f.handler.handle(&failure), Action::NotifyAccountError));

        let notes = f.notifications.drain();
        assert!(notes[0].cause().unwrap().is_same(&root));
        // asked once per step
        assert_eq!(realm.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_account_error_stops_at_foreign_cause() {
        let f = passthrough();
        let failure = Failure::account(ACCOUNT, "outer").caused_by(Failure::malformed_response("bad json"));
        assert!(matches!(f.handler.classify(&failure), Action::NotifyAccountError));
    }

    #[test]
    fn test_account_error_specialisation_as_cause() {
        let f = passthrough();
        let failure = Failure::account(ACCOUNT, "outer").caused_by(Failure::unsupported_account(ACCOUNT));
        assert!(matches!(f.handler.handle(&failure), Action::NotifyUnsupportedAccount));
    }

    #[test]
    fn test_runtime_wrapper_is_unwrapped() {
        let realm = Arc::new(RecordingRealm::default());
        let f = fixture(realm.clone());

        let inner = Failure::account(ACCOUNT, "token expired");
        let wrapped = Failure::account_runtime(inner.clone());

        match f.handler.classify(&wrapped) {
            Action::Delegate(next) => {
                assert_eq!(next.account_id(), Some(ACCOUNT));
                assert!(next.cause().unwrap().is_same(&inner));
            }
            other => panic!("expected delegation, got {other:?}"),
        }

        assert!(matches!(f.handler.handle(&wrapped), Action::NotifyAccountError));
        assert_eq!(f.notifications.len(), 1);
        assert!(realm.calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_runtime_wrapper_suppressed_by_realm() {
        let f = fixture(Arc::new(RecordingRealm {
            handles: true,
            ..Default::default()
        }));
        let wrapped = Failure::account_runtime(Failure::account(ACCOUNT, "token expired"));
        assert!(f.handler.handle(&wrapped).is_suppress());
        assert!(f.notifications.is_empty());
    }

    #[test]
    fn test_plain_kinds() {
        let f = passthrough();
        assert!(matches!(
            f.handler.handle(&Failure::transport_io("timeout")),
            Action::NotifyNoInternet
        ));
        assert!(matches!(
            f.handler.handle(&Failure::malformed_response("unexpected token")),
            Action::NotifyInvalidResponse
        ));
        assert!(matches!(
            f.handler.handle(&Failure::unclassified("boom")),
            Action::NotifyUndefined
        ));
        assert_eq!(
            kinds(&f.notifications),
            [
                NotificationKind::NoInternet,
                NotificationKind::InvalidResponse,
                NotificationKind::UndefinedError,
            ]
        );
    }

    #[test]
    fn test_internet_failure_walk() {
        assert!(is_internet_failure(&Failure::io("eof")));
        assert!(is_internet_failure(
            &Failure::transport_io("read").caused_by(Failure::io("eof"))
        ));
        assert!(!is_internet_failure(&Failure::transport_io("read")));

        let looped = Failure::transport_io("loop");
        assert!(!is_internet_failure(&looped.clone().caused_by(looped)));
    }

    #[test]
    fn test_suppress_never_notifies() {
        let f = passthrough();
        f.network.set(NetworkState::Disconnected);
        let failures = [
            Failure::account_disconnected(ACCOUNT),
            Failure::account_connection(ACCOUNT, "a"),
            Failure::account_connection(ACCOUNT, "b").caused_by(Failure::account_connection(ACCOUNT, "c")),
        ];
        for failure in &failures {
            assert!(f.handler.handle(failure).is_suppress());
        }
        assert!(f.notifications.is_empty());
    }
}
