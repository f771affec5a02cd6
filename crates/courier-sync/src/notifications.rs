//! User-facing notifications produced by failure classification.

use std::sync::Mutex;

use courier_shared::Failure;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    UnsupportedAccount,
    AccountError,
    ConnectionError,
    NoInternet,
    InvalidResponse,
    UndefinedError,
}

impl NotificationKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::UnsupportedAccount => "Account is not supported",
            Self::AccountError => "Account error",
            Self::ConnectionError => "Unable to connect to account",
            Self::NoInternet => "No internet connection",
            Self::InvalidResponse => "Invalid response from server",
            Self::UndefinedError => "Unexpected error",
        }
    }
}

/// Advisory notification, decorated with the failure that caused it
#[derive(Debug, Clone)]
pub struct Notification {
    kind: NotificationKind,
    cause: Option<Failure>,
}

impl Notification {
    pub fn new(kind: NotificationKind) -> Self {
        Self { kind, cause: None }
    }

    pub fn caused_by(mut self, failure: Failure) -> Self {
        self.cause = Some(failure);
        self
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn cause(&self) -> Option<&Failure> {
        self.cause.as_ref()
    }
}

/// Fire-and-forget notification target
pub trait NotificationSink: Send + Sync {
    fn add(&self, notification: Notification);
}

/// Keeps notifications until the presentation layer takes them.
#[derive(Debug, Default)]
pub struct NotificationService {
    pending: Mutex<Vec<Notification>>,
}

impl NotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all pending notifications, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        self.pending
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for NotificationService {
    fn add(&self, notification: Notification) {
        tracing::debug!(kind = ?notification.kind(), "notification added");
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(notification);
        }
    }
}
