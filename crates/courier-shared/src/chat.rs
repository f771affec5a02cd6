//! Chat aggregate and the remote chat payload it is built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{PRIVATE_CHAT_DELIMITER, PROPERTY_PRIVATE};
use crate::entity::{Entity, EntityAware};
use crate::message::Message;
use crate::properties::{Properties, Property};
use crate::user::User;

/// A conversation (one-to-one or group).
///
/// `is_private` is derived from the `"private"` property exactly once, when
/// the chat is constructed. Replacing the properties afterwards does not flip
/// it; build a new chat through [`Chat::new`] for that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ChatRepr")]
pub struct Chat {
    entity: Entity,
    messages_count: u32,
    properties: Properties,
    last_messages_sync_date: Option<DateTime<Utc>>,
    is_private: bool,
}

impl Chat {
    pub fn new(
        entity: Entity,
        messages_count: u32,
        properties: Properties,
        last_messages_sync_date: Option<DateTime<Utc>>,
    ) -> Self {
        let is_private = properties
            .value(PROPERTY_PRIVATE)
            .map_or(true, |value| value.eq_ignore_ascii_case("true"));
        Self {
            entity,
            messages_count,
            properties,
            last_messages_sync_date,
            is_private,
        }
    }

    /// One-to-one chat with the `"private"` property set explicitly
    pub fn new_private(entity: Entity) -> Self {
        Self::with_private_flag(entity, true)
    }

    /// Placeholder for a chat known only by id (e.g. referenced by a message
    /// that arrived before the chat itself was synced).
    pub fn new_fake(entity_id: &str) -> Option<Self> {
        Entity::from_entity_id(entity_id).map(|entity| Self::with_private_flag(entity, false))
    }

    fn with_private_flag(entity: Entity, is_private: bool) -> Self {
        Self {
            entity,
            messages_count: 0,
            properties: vec![Property::new(PROPERTY_PRIVATE, is_private.to_string())].into(),
            last_messages_sync_date: None,
            is_private,
        }
    }

    pub fn messages_count(&self) -> u32 {
        self.messages_count
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn last_messages_sync_date(&self) -> Option<DateTime<Utc>> {
        self.last_messages_sync_date
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    pub fn with_messages_sync_date(&self, date: DateTime<Utc>) -> Self {
        Self {
            last_messages_sync_date: Some(date),
            ..self.clone()
        }
    }

    pub fn with_messages_sync_now(&self) -> Self {
        self.with_messages_sync_date(Utc::now())
    }

    pub fn with_messages_count(&self, messages_count: u32) -> Self {
        Self {
            messages_count,
            ..self.clone()
        }
    }

    /// Replace the whole property bag. `is_private` is kept as-is.
    pub fn with_properties(&self, properties: Properties) -> Self {
        Self {
            properties,
            ..self.clone()
        }
    }
}

impl EntityAware for Chat {
    fn entity(&self) -> &Entity {
        &self.entity
    }
}

impl PartialEq for Chat {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}

impl Eq for Chat {}

/// Remote/stored form of a chat; `is_private` is always re-derived
#[derive(Deserialize)]
struct ChatRepr {
    entity: Entity,
    #[serde(default)]
    messages_count: u32,
    #[serde(default)]
    properties: Properties,
    #[serde(default)]
    last_messages_sync_date: Option<DateTime<Utc>>,
}

impl From<ChatRepr> for Chat {
    fn from(repr: ChatRepr) -> Self {
        Chat::new(
            repr.entity,
            repr.messages_count,
            repr.properties,
            repr.last_messages_sync_date,
        )
    }
}

/// Identity of the private chat between `user` and `contact`, owned by the
/// user's account.
pub fn private_chat_id(user: &Entity, contact: &Entity) -> Entity {
    Entity::new(
        user.account_id(),
        format!(
            "{}{PRIVATE_CHAT_DELIMITER}{}",
            user.account_entity_id(),
            contact.account_entity_id()
        ),
    )
}

/// Chat as delivered by a remote fetch: the chat itself plus the participants
/// and the messages that seed a freshly inserted chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiChat {
    pub chat: Chat,
    #[serde(default)]
    pub participants: Vec<User>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ApiChat {
    pub fn new(chat: Chat, participants: Vec<User>, messages: Vec<Message>) -> Self {
        Self {
            chat,
            participants,
            messages,
        }
    }

    pub fn new_private(chat_id: Entity, participants: Vec<User>, messages: Vec<Message>) -> Self {
        let chat = Chat::new_private(chat_id).with_messages_count(messages.len() as u32);
        Self::new(chat, participants, messages)
    }

    /// Participants other than `owner_id`
    pub fn other_participants<'a>(&'a self, owner_id: &'a str) -> impl Iterator<Item = &'a User> + 'a {
        self.participants
            .iter()
            .filter(move |p| p.entity_id() != owner_id)
    }
}

impl EntityAware for ApiChat {
    fn entity(&self) -> &Entity {
        self.chat.entity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_defaults_to_true() {
        let chat = Chat::new(Entity::new("test~0", "c1"), 0, Properties::new(), None);
        assert!(chat.is_private());
    }

    #[test]
    fn test_private_from_first_property() {
        let props: Properties = vec![
            Property::new(PROPERTY_PRIVATE, "false"),
            Property::new(PROPERTY_PRIVATE, "true"),
        ]
        .into();
        let chat = Chat::new(Entity::new("test~0", "c1"), 0, props, None);
        assert!(!chat.is_private());
    }

    #[test]
    fn test_private_flag_not_recomputed() {
        let chat = Chat::new(Entity::new("test~0", "c1"), 0, Properties::new(), None);
        let edited = chat.with_properties(vec![Property::new(PROPERTY_PRIVATE, "false")].into());
        assert!(edited.is_private());
        assert_eq!(edited.properties().value(PROPERTY_PRIVATE), Some("false"));

        let rebuilt = Chat::new(
            edited.entity().clone(),
            edited.messages_count(),
            edited.properties().clone(),
            edited.last_messages_sync_date(),
        );
        assert!(!rebuilt.is_private());
    }

    #[test]
    fn test_sync_date_update_returns_new_value() {
        let chat = Chat::new_private(Entity::new("test~0", "c1"));
        let synced = chat.with_messages_sync_now();
        assert!(chat.last_messages_sync_date().is_none());
        assert!(synced.last_messages_sync_date().is_some());
        assert_eq!(chat, synced);
        assert_eq!(synced.properties(), chat.properties());
    }

    #[test]
    fn test_fake_chat() {
        let chat = Chat::new_fake("test~0:c9").unwrap();
        assert!(!chat.is_private());
        assert_eq!(chat.properties().value(PROPERTY_PRIVATE), Some("false"));
        assert!(Chat::new_fake("garbage").is_none());
    }

    #[test]
    fn test_private_chat_id() {
        let user = Entity::new("test~0", "1");
        let contact = Entity::new("test~0", "2");
        let id = private_chat_id(&user, &contact);
        assert_eq!(id.entity_id(), "test~0:1_2");
        assert_eq!(id.account_id(), "test~0");
    }

    #[test]
    fn test_deserialized_chat_derives_private_flag() {
        let json = r#"{
            "entity": {"account_id": "test~0", "account_entity_id": "c1"},
            "properties": [{"name": "private", "value": "false"}],
            "is_private": true
        }"#;
        let chat: Chat = serde_json::from_str(json).unwrap();
        assert!(!chat.is_private());
        assert_eq!(chat.messages_count(), 0);
    }

    #[test]
    fn test_other_participants() {
        let owner = User::new_empty(Entity::new("test~0", "1")).freeze();
        let contact = User::new_empty(Entity::new("test~0", "2")).freeze();
        let api_chat = ApiChat::new_private(
            private_chat_id(owner.entity(), contact.entity()),
            vec![owner.clone(), contact.clone()],
            Vec::new(),
        );

        let others: Vec<_> = api_chat.other_participants(owner.entity_id()).collect();
        assert_eq!(others, vec![&contact]);
        assert_eq!(api_chat.entity_id(), "test~0:1_2");
    }
}
