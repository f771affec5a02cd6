//! User and contact persistence.

use std::collections::BTreeSet;

use courier_shared::{Entity, EntityAware, User};
use rusqlite::{params, Connection, OptionalExtension};

use crate::adapter::{LinkScope, PersistenceAdapter};
use crate::batch::plan_contact_merge;
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::merge::{compute_merge, MergePolicy, MergeResult};
use crate::ops::StoreOp;
use crate::sql::{self, PropertyTable};

impl Database {
    /// Reconcile the contacts of `owner_id` with a remote batch and apply the
    /// result atomically.
    pub fn merge_user_contacts(
        &mut self,
        owner_id: &str,
        contacts: Vec<User>,
        policy: MergePolicy,
    ) -> Result<MergeResult<User>> {
        let result = compute_merge(&*self, LinkScope::Contacts, owner_id, contacts, policy)?;
        let ops = plan_contact_merge(owner_id, &result, self.max_in_count());
        self.apply_batch(&ops)?;

        tracing::info!(owner_id, stats = ?result.stats(), "user contacts merged");
        Ok(result)
    }

    /// Insert a user with its properties.
    pub fn insert_user(&mut self, user: &User) -> Result<()> {
        self.apply_batch(&[
            StoreOp::InsertUser(user.clone()),
            StoreOp::InsertUserProperties(user.clone()),
        ])?;
        Ok(())
    }

    pub fn read_user(&self, user_id: &str) -> Result<User> {
        let entity = self
            .conn()
            .query_row(
                "SELECT account_id, account_entity_id FROM users WHERE id = ?1",
                params![user_id],
                row_to_entity,
            )
            .optional()?
            .ok_or(StoreError::NotFound)?;
        load_user(self.conn(), entity)
    }

    /// Contacts of `user_id`, ordered by id
    pub fn read_contacts(&self, user_id: &str) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT account_id, account_entity_id FROM users
             WHERE id IN (SELECT contact_id FROM user_contacts WHERE user_id = ?1)
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], row_to_entity)?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(load_user(self.conn(), row?)?);
        }
        Ok(contacts)
    }

    pub fn read_contact_ids(&self, user_id: &str) -> Result<BTreeSet<String>> {
        self.read_linked_ids(LinkScope::Contacts, user_id)
    }

    pub fn read_all_user_ids(&self) -> Result<BTreeSet<String>> {
        self.read_all_known_ids(LinkScope::Contacts)
    }

    // ON DELETE CASCADE: properties and contact links pointing at the user
    pub fn delete_user(&self, user_id: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        Ok(affected > 0)
    }
}

fn row_to_entity(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entity> {
    let account_id: String = row.get(0)?;
    let account_entity_id: String = row.get(1)?;
    Ok(Entity::new(account_id, account_entity_id))
}

fn load_user(conn: &Connection, entity: Entity) -> Result<User> {
    let properties = sql::read_properties(conn, PropertyTable::User, entity.entity_id())?;
    Ok(User::new(entity, properties))
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_shared::constants::{
        PROPERTY_FIRST_NAME, PROPERTY_LAST_NAME, PROPERTY_ONLINE, PROPERTY_PHONE,
    };

    const OWNER: &str = "test~0:owner";

    fn contact(i: usize) -> User {
        let mut user = User::new_empty(Entity::new("test~0", i.to_string()));
        user.set_property(PROPERTY_LAST_NAME, format!("last_name_{i}"))
            .set_property(PROPERTY_FIRST_NAME, format!("first_name_{i}"))
            .set_property(PROPERTY_ONLINE, (i % 2).to_string())
            .set_property(PROPERTY_PHONE, format!("phone_{i}"));
        user.freeze()
    }

    fn contacts(count: usize) -> Vec<User> {
        (0..count).map(contact).collect()
    }

    #[test]
    fn test_merge_contacts_round_trip() {
        let mut db = Database::open_in_memory().unwrap();
        let result = db
            .merge_user_contacts(OWNER, contacts(20), MergePolicy::partial())
            .unwrap();
        assert_eq!(result.added_objects().len(), 20);

        let stored = db.read_contacts(OWNER).unwrap();
        assert_eq!(stored.len(), 20);

        let third = db.read_user("test~0:3").unwrap();
        assert_eq!(third.display_name(), "first_name_3 last_name_3");
        assert!(third.is_online());
        assert_eq!(third.phone(), Some("phone_3"));
        assert_eq!(third.properties().len(), 4);
    }

    #[test]
    fn test_contacts_shared_between_owners() {
        let mut db = Database::open_in_memory().unwrap();
        db.merge_user_contacts("test~0:other", contacts(3), MergePolicy::partial())
            .unwrap();

        let result = db
            .merge_user_contacts(OWNER, contacts(5), MergePolicy::partial())
            .unwrap();
        assert_eq!(result.added_object_links().len(), 3);
        assert_eq!(result.added_objects().len(), 2);
        assert_eq!(db.read_all_user_ids().unwrap().len(), 5);
    }

    #[test]
    fn test_complete_contact_resync() {
        let mut db = Database::open_in_memory().unwrap();
        db.merge_user_contacts(OWNER, contacts(4), MergePolicy::partial())
            .unwrap();

        let went_online = contact(0).with_online(true);
        let result = db
            .merge_user_contacts(OWNER, vec![went_online, contact(1)], MergePolicy::complete())
            .unwrap();

        assert_eq!(result.updated_objects().len(), 2);
        assert_eq!(
            result.removed_object_ids(),
            ["test~0:2".to_string(), "test~0:3".to_string()]
        );
        assert_eq!(db.read_contact_ids(OWNER).unwrap().len(), 2);
        assert!(db.read_user("test~0:0").unwrap().is_online());
        // unlinked, not deleted
        assert!(db.read_user("test~0:3").is_ok());
    }

    #[test]
    fn test_partial_resync_does_not_overwrite() {
        let mut db = Database::open_in_memory().unwrap();
        db.merge_user_contacts(OWNER, contacts(1), MergePolicy::partial())
            .unwrap();

        let result = db
            .merge_user_contacts(OWNER, vec![contact(0).with_online(true)], MergePolicy::partial())
            .unwrap();

        assert!(result.is_empty());
        assert!(!db.read_user("test~0:0").unwrap().is_online());
    }

    #[test]
    fn test_delete_user_cascades_links() {
        let mut db = Database::open_in_memory().unwrap();
        db.merge_user_contacts(OWNER, contacts(2), MergePolicy::partial())
            .unwrap();

        assert!(db.delete_user("test~0:1").unwrap());
        assert_eq!(db.read_contact_ids(OWNER).unwrap().len(), 1);
        assert!(matches!(db.read_user("test~0:1"), Err(StoreError::NotFound)));
    }

    #[test]
    fn test_empty_owner_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db
            .merge_user_contacts("", contacts(1), MergePolicy::partial())
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn test_insert_user() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_user(&contact(9)).unwrap();
        assert!(db.insert_user(&contact(9)).is_err());
        assert_eq!(db.read_user("test~0:9").unwrap().phone(), Some("phone_9"));
    }
}
