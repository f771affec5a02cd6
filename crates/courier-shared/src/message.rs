use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityAware};

/// A single chat message.
///
/// Messages order by `send_date`; the entity id breaks ties so the order is
/// total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub entity: Entity,
    pub author: Entity,
    pub recipient: Entity,
    pub body: String,
    pub send_date: DateTime<Utc>,
    pub read: bool,
}

impl Message {
    /// New message with a freshly generated identity in the author's account
    pub fn new(
        author: Entity,
        recipient: Entity,
        body: impl Into<String>,
        send_date: DateTime<Utc>,
    ) -> Self {
        Self {
            entity: Entity::generate(author.account_id()),
            author,
            recipient,
            body: body.into(),
            send_date,
            read: false,
        }
    }

    pub fn with_read(&self, read: bool) -> Self {
        Self {
            read,
            ..self.clone()
        }
    }

    /// Whether `user` wrote this message
    pub fn is_outgoing_for(&self, user: &Entity) -> bool {
        &self.author == user
    }
}

impl EntityAware for Message {
    fn entity(&self) -> &Entity {
        &self.entity
    }
}

impl PartialOrd for Message {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Message {
    fn cmp(&self, other: &Self) -> Ordering {
        self.send_date
            .cmp(&other.send_date)
            .then_with(|| self.entity.entity_id().cmp(other.entity.entity_id()))
    }
}
