//! # courier-shared
//!
//! Domain types shared by the store and the sync service: entity identity,
//! property bags, the chat/user/message aggregates and the failure taxonomy
//! raised by remote collaborators.

pub mod chat;
pub mod constants;
pub mod entity;
pub mod error;
pub mod message;
pub mod properties;
pub mod user;

pub use chat::{private_chat_id, ApiChat, Chat};
pub use entity::{Entity, EntityAware};
pub use error::{Failure, FailureId, FailureKind};
pub use message::Message;
pub use properties::{MutableProperties, Properties, Property};
pub use user::{MutableUser, User};
