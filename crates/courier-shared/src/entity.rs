use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ACCOUNT_ID_DELIMITER, ENTITY_ID_DELIMITER};

/// Canonical identity of a user, chat or message.
///
/// The derived `entity_id` is unique across all accounts and stable between
/// syncs. Two entities are equal iff their `entity_id`s are equal; the other
/// fields are carried for persistence and display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "EntityRepr", from = "EntityRepr")]
pub struct Entity {
    entity_id: String,
    account_id: String,
    account_entity_id: String,
    realm_def_id: String,
    /// Set when the id was generated locally rather than assigned remotely
    app_account_entity_id: Option<String>,
}

impl Entity {
    /// Identity of an object known to the remote account under `account_entity_id`
    pub fn new(account_id: impl Into<String>, account_entity_id: impl Into<String>) -> Self {
        let account_id = account_id.into();
        let account_entity_id = account_entity_id.into();
        Self {
            entity_id: format!("{account_id}{ENTITY_ID_DELIMITER}{account_entity_id}"),
            realm_def_id: realm_def_id_of(&account_id).to_string(),
            account_id,
            account_entity_id,
            app_account_entity_id: None,
        }
    }

    /// Fresh identity generated by the application (e.g. an outgoing message)
    pub fn generate(account_id: impl Into<String>) -> Self {
        let generated = Uuid::new_v4().to_string();
        let mut entity = Self::new(account_id, generated.clone());
        entity.app_account_entity_id = Some(generated);
        entity
    }

    /// Parse a derived entity id back into its parts.
    ///
    /// Returns `None` when the id has no delimiter or either half is empty.
    pub fn from_entity_id(entity_id: &str) -> Option<Self> {
        let (account_id, account_entity_id) = entity_id.split_once(ENTITY_ID_DELIMITER)?;
        if account_id.is_empty() || account_entity_id.is_empty() {
            return None;
        }
        Some(Self::new(account_id, account_entity_id))
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn account_entity_id(&self) -> &str {
        &self.account_entity_id
    }

    pub fn realm_def_id(&self) -> &str {
        &self.realm_def_id
    }

    pub fn app_account_entity_id(&self) -> Option<&str> {
        self.app_account_entity_id.as_deref()
    }

    /// Short form for logs
    pub fn short(&self) -> &str {
        let end = self
            .entity_id
            .char_indices()
            .nth(24)
            .map_or(self.entity_id.len(), |(i, _)| i);
        &self.entity_id[..end]
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.entity_id == other.entity_id
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity_id.hash(state);
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.entity_id)
    }
}

/// Anything that carries an [`Entity`] and can therefore be reconciled by id
pub trait EntityAware {
    fn entity(&self) -> &Entity;

    fn entity_id(&self) -> &str {
        self.entity().entity_id()
    }
}

impl EntityAware for Entity {
    fn entity(&self) -> &Entity {
        self
    }
}

/// Wire form: only the assigned parts, derived ids are rebuilt on read
#[derive(Serialize, Deserialize)]
struct EntityRepr {
    account_id: String,
    account_entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    app_account_entity_id: Option<String>,
}

impl From<EntityRepr> for Entity {
    fn from(repr: EntityRepr) -> Self {
        let mut entity = Entity::new(repr.account_id, repr.account_entity_id);
        entity.app_account_entity_id = repr.app_account_entity_id;
        entity
    }
}

impl From<Entity> for EntityRepr {
    fn from(entity: Entity) -> Self {
        Self {
            account_id: entity.account_id,
            account_entity_id: entity.account_entity_id,
            app_account_entity_id: entity.app_account_entity_id,
        }
    }
}

fn realm_def_id_of(account_id: &str) -> &str {
    account_id
        .split_once(ACCOUNT_ID_DELIMITER)
        .map_or(account_id, |(realm_def, _)| realm_def)
}
