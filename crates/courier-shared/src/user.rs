use serde::{Deserialize, Serialize};

use crate::constants::{
    PROPERTY_FIRST_NAME, PROPERTY_LAST_NAME, PROPERTY_NICKNAME, PROPERTY_ONLINE, PROPERTY_PHONE,
};
use crate::entity::{Entity, EntityAware};
use crate::properties::{MutableProperties, Properties};

/// A user or contact as known to one account.
///
/// Immutable: edits go through [`MutableUser`] and come back as a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    entity: Entity,
    properties: Properties,
}

impl User {
    pub fn new(entity: Entity, properties: Properties) -> Self {
        Self { entity, properties }
    }

    /// User without any properties, ready to be filled through [`MutableUser`]
    pub fn new_empty(entity: Entity) -> MutableUser {
        MutableUser {
            entity,
            properties: MutableProperties::new(),
        }
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.value(name)
    }

    /// First and last name when present, otherwise the nickname, otherwise
    /// the account-local id.
    pub fn display_name(&self) -> String {
        let first = self.property(PROPERTY_FIRST_NAME).unwrap_or_default();
        let last = self.property(PROPERTY_LAST_NAME).unwrap_or_default();
        let full = format!("{first} {last}");
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        match self.property(PROPERTY_NICKNAME) {
            Some(nick) if !nick.is_empty() => nick.to_string(),
            _ => self.entity.account_entity_id().to_string(),
        }
    }

    /// Remote payloads encode the flag as `"1"`/`"0"` or `"true"`/`"false"`
    pub fn is_online(&self) -> bool {
        matches!(self.property(PROPERTY_ONLINE), Some("1") | Some("true"))
    }

    pub fn phone(&self) -> Option<&str> {
        self.property(PROPERTY_PHONE)
    }

    pub fn with_online(&self, online: bool) -> Self {
        Self {
            entity: self.entity.clone(),
            properties: self
                .properties
                .with_property(PROPERTY_ONLINE, if online { "1" } else { "0" }),
        }
    }

    pub fn to_mutable(&self) -> MutableUser {
        MutableUser {
            entity: self.entity.clone(),
            properties: self.properties.to_mutable(),
        }
    }
}

impl EntityAware for User {
    fn entity(&self) -> &Entity {
        &self.entity
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}

impl Eq for User {}

/// Staged edits to a user before they are committed
#[derive(Debug, Clone)]
pub struct MutableUser {
    entity: Entity,
    properties: MutableProperties,
}

impl MutableUser {
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn properties_mut(&mut self) -> &mut MutableProperties {
        &mut self.properties
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.properties.set_property(name, value);
        self
    }

    pub fn freeze(self) -> User {
        User {
            entity: self.entity,
            properties: self.properties.freeze(),
        }
    }
}
