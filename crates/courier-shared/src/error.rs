//! Failures raised by account, network and parsing collaborators.
//!
//! A [`Failure`] is a tagged kind plus an optional shared cause. Every failure
//! gets an identity when it is created and keeps it when cloned, so a failure
//! whose cause is a clone of itself can be recognised and the cause chain
//! walk stopped there.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// No realm is able to serve this account
    #[error("Unsupported account {account_id}")]
    UnsupportedAccount { account_id: String },

    /// The account connection was stopped on purpose
    #[error("Account {account_id} is disconnected")]
    AccountDisconnected { account_id: String },

    /// Talking to the account's remote service failed
    #[error("Connection error for account {account_id}")]
    AccountConnection { account_id: String },

    /// Any other account-level failure
    #[error("Account error for account {account_id}")]
    Account { account_id: String },

    /// Request could not be sent or the response could not be read
    #[error("Transport I/O error")]
    TransportIo,

    /// Low-level socket/stream failure
    #[error("I/O error")]
    Io,

    /// The remote answered with something we cannot parse
    #[error("Malformed response")]
    MalformedResponse,

    /// Unchecked carrier of an account failure; unwrapped before handling
    #[error("Account runtime error for account {account_id}")]
    AccountRuntime { account_id: String },

    /// Local storage failed
    #[error("Storage error")]
    Storage,

    #[error("Unclassified error")]
    Unclassified,
}

impl FailureKind {
    /// Account the failure belongs to, for the account-level kinds
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Self::UnsupportedAccount { account_id }
            | Self::AccountDisconnected { account_id }
            | Self::AccountConnection { account_id }
            | Self::Account { account_id }
            | Self::AccountRuntime { account_id } => Some(account_id),
            _ => None,
        }
    }

    /// `AccountConnection`, `AccountDisconnected` and `UnsupportedAccount`
    /// are specialisations of a generic account failure
    pub fn is_account(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedAccount { .. }
                | Self::AccountDisconnected { .. }
                | Self::AccountConnection { .. }
                | Self::Account { .. }
        )
    }
}

/// Identity of a failure instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FailureId(Uuid);

#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct Failure {
    id: FailureId,
    kind: FailureKind,
    message: String,
    #[source]
    cause: Option<Arc<Failure>>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            id: FailureId(Uuid::new_v4()),
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn unsupported_account(account_id: impl Into<String>) -> Self {
        let account_id = account_id.into();
        let message = format!("no realm for account {account_id}");
        Self::new(FailureKind::UnsupportedAccount { account_id }, message)
    }

    pub fn account_disconnected(account_id: impl Into<String>) -> Self {
        Self::new(
            FailureKind::AccountDisconnected {
                account_id: account_id.into(),
            },
            "account is disconnected",
        )
    }

    pub fn account_connection(account_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            FailureKind::AccountConnection {
                account_id: account_id.into(),
            },
            message,
        )
    }

    pub fn account(account_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            FailureKind::Account {
                account_id: account_id.into(),
            },
            message,
        )
    }

    /// Wrap an account failure into its unchecked carrier
    pub fn account_runtime(inner: Failure) -> Self {
        let account_id = inner.kind.account_id().unwrap_or_default().to_string();
        let message = inner.message.clone();
        Self::new(FailureKind::AccountRuntime { account_id }, message).caused_by(inner)
    }

    pub fn transport_io(message: impl Into<String>) -> Self {
        Self::new(FailureKind::TransportIo, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Io, message)
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedResponse, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Storage, message)
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unclassified, message)
    }

    /// Attach a cause. The identity of `self` is kept.
    pub fn caused_by(mut self, cause: Failure) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn id(&self) -> FailureId {
        self.id
    }

    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn account_id(&self) -> Option<&str> {
        self.kind.account_id()
    }

    pub fn cause(&self) -> Option<&Failure> {
        self.cause.as_deref()
    }

    /// Same failure instance (or a clone of it)
    pub fn is_same(&self, other: &Failure) -> bool {
        self.id == other.id
    }

    /// Cause that is a different failure than `self`, if any
    pub fn distinct_cause(&self) -> Option<&Failure> {
        self.cause().filter(|cause| !cause.is_same(self))
    }

    /// Walk the cause chain starting at `self`.
    ///
    /// The walk stops at the first failure without a cause or whose cause is
    /// itself, and never revisits a failure it has already yielded.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            next: Some(self),
            seen: Vec::new(),
        }
    }
}

pub struct Chain<'a> {
    next: Option<&'a Failure>,
    seen: Vec<FailureId>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Failure;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if self.seen.contains(&current.id) {
            return None;
        }
        self.seen.push(current.id);
        self.next = current.distinct_cause();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_clone_keeps_identity() {
        let a = Failure::io("socket closed");
        let b = a.clone();
        assert!(a.is_same(&b));
        assert!(!a.is_same(&Failure::io("socket closed")));
    }

    #[test]
    fn test_self_referential_chain_terminates() {
        let inner = Failure::account_connection("test~0", "timeout");
        let outer = inner.clone().caused_by(inner.clone());

        assert!(outer.distinct_cause().is_none());
        assert_eq!(outer.chain().count(), 1);
    }

    #[test]
    fn test_chain_order() {
        let root = Failure::io("reset by peer");
        let mid = Failure::transport_io("request failed").caused_by(root);
        let top = Failure::account_connection("test~0", "sync failed").caused_by(mid);

        let kinds: Vec<_> = top.chain().map(|f| f.kind().clone()).collect();
        assert_eq!(
            kinds,
            vec![
                FailureKind::AccountConnection {
                    account_id: "test~0".to_string()
                },
                FailureKind::TransportIo,
                FailureKind::Io,
            ]
        );
    }

    #[test]
    fn test_chain_cycle_through_clone() {
        // A -> B -> A' where A' is a clone of A
        let a = Failure::account("test~0", "a");
        let b = Failure::account("test~0", "b").caused_by(a.clone());
        let a_with_cycle = a.caused_by(b);

        assert_eq!(a_with_cycle.chain().count(), 2);
    }

    #[test]
    fn test_runtime_wrapper() {
        let inner = Failure::account("vk~1", "token expired");
        let wrapped = Failure::account_runtime(inner.clone());

        assert_eq!(wrapped.account_id(), Some("vk~1"));
        assert!(wrapped.cause().unwrap().is_same(&inner));
        assert!(wrapped.source().is_some());
        assert!(wrapped.to_string().contains("token expired"));
    }

    #[test]
    fn test_account_kinds() {
        assert!(Failure::unsupported_account("x").kind().is_account());
        assert!(Failure::account_disconnected("x").kind().is_account());
        assert!(!Failure::transport_io("x").kind().is_account());
        assert_eq!(Failure::malformed_response("x").account_id(), None);
    }
}
