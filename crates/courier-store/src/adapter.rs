//! The narrow storage contract the merge engine runs against.

use std::collections::BTreeSet;

use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::ops::StoreOp;

/// Which owner association a merge reconciles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkScope {
    /// `user_chats`: chats the owner participates in
    Chats,
    /// `user_contacts`: users in the owner's contact list
    Contacts,
}

pub trait PersistenceAdapter {
    /// Ids currently linked to `owner_id` in `scope`
    fn read_linked_ids(&self, scope: LinkScope, owner_id: &str) -> Result<BTreeSet<String>>;

    /// Every id stored in the core table of `scope`, whoever it is linked to
    fn read_all_known_ids(&self, scope: LinkScope) -> Result<BTreeSet<String>>;

    /// Apply `ops` in order as one all-or-nothing unit.
    ///
    /// Returns the total number of affected rows.
    fn apply_batch(&mut self, ops: &[StoreOp]) -> Result<usize>;
}

impl PersistenceAdapter for Database {
    fn read_linked_ids(&self, scope: LinkScope, owner_id: &str) -> Result<BTreeSet<String>> {
        let sql = match scope {
            LinkScope::Chats => "SELECT chat_id FROM user_chats WHERE user_id = ?1",
            LinkScope::Contacts => "SELECT contact_id FROM user_contacts WHERE user_id = ?1",
        };
        let mut stmt = self.conn().prepare_cached(sql)?;
        let rows = stmt.query_map(params![owner_id], |row| row.get::<_, String>(0))?;
        rows.collect::<std::result::Result<BTreeSet<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    fn read_all_known_ids(&self, scope: LinkScope) -> Result<BTreeSet<String>> {
        let sql = match scope {
            LinkScope::Chats => "SELECT id FROM chats",
            LinkScope::Contacts => "SELECT id FROM users",
        };
        let mut stmt = self.conn().prepare_cached(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<std::result::Result<BTreeSet<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    fn apply_batch(&mut self, ops: &[StoreOp]) -> Result<usize> {
        // Dropping the transaction without commit rolls it back
        let tx = self.conn_mut().transaction()?;

        let mut affected = 0;
        for (index, op) in ops.iter().enumerate() {
            affected += op.exec(&tx).map_err(|source| {
                tracing::warn!(index, operation = op.name(), error = %source, "batch operation failed, rolling back");
                StoreError::Batch {
                    index,
                    operation: op.name(),
                    source,
                }
            })?;
        }

        tx.commit()?;

        tracing::debug!(operations = ops.len(), affected, "batch applied");
        Ok(affected)
    }
}
