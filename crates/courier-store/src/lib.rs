//! # courier-store
//!
//! Local SQLite storage for the courier messaging client and the merge engine
//! that reconciles it with remote state.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection`. A sync for one owner reads the owner's links,
//! classifies the remote batch ([`merge`]), plans primitive operations
//! ([`batch`]) and applies them in a single transaction ([`adapter`]).

pub mod adapter;
pub mod batch;
pub mod chats;
pub mod database;
pub mod merge;
pub mod messages;
pub mod migrations;
pub mod ops;
pub mod users;

mod error;
mod sql;

pub use adapter::{LinkScope, PersistenceAdapter};
pub use database::Database;
pub use error::{Result, StoreError};
pub use merge::{MergePolicy, MergeResult, MergeStats};
pub use ops::StoreOp;
