//! # courier-sync
//!
//! Async account sync on top of `courier-store`: fetches remote chats and
//! contacts through a [`RemoteSource`], merges them for the account's user
//! under a per-owner lock, and routes every remote failure through the
//! [`ExceptionHandler`] before it reaches the caller.

pub mod accounts;
pub mod config;
pub mod exception;
pub mod locks;
pub mod network;
pub mod notifications;
pub mod service;
pub mod telemetry;

mod error;

pub use accounts::{Account, AccountRegistry, AccountService, ErrorHandler};
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use exception::{Action, ExceptionHandler};
pub use locks::OwnerLocks;
pub use network::{NetworkState, NetworkStateService, SharedNetworkState};
pub use notifications::{Notification, NotificationKind, NotificationService, NotificationSink};
pub use service::{RemoteSource, SyncService};
pub use telemetry::init_tracing;
