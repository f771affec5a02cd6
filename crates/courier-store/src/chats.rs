//! Chat persistence: reads, single-chat maintenance and the owner merge.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use courier_shared::{ApiChat, Chat, Entity, EntityAware, Properties};
use rusqlite::{params, Connection, OptionalExtension};

use crate::adapter::{LinkScope, PersistenceAdapter};
use crate::batch::plan_chat_merge;
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::merge::{compute_merge, MergePolicy, MergeResult};
use crate::ops::StoreOp;
use crate::sql::{self, parse_timestamp, PropertyTable};

const SELECT_CHAT: &str =
    "SELECT id, account_id, account_entity_id, messages_count, last_messages_sync_date FROM chats";

impl Database {
    // ------------------------------------------------------------------
    // Merge
    // ------------------------------------------------------------------

    /// Reconcile the chats linked to `owner_id` with a remote batch and apply
    /// the result atomically.
    pub fn merge_user_chats(
        &mut self,
        owner_id: &str,
        api_chats: Vec<ApiChat>,
        policy: MergePolicy,
    ) -> Result<MergeResult<ApiChat>> {
        let result = compute_merge(&*self, LinkScope::Chats, owner_id, api_chats, policy)?;
        let ops = plan_chat_merge(owner_id, &result, self.max_in_count());
        self.apply_batch(&ops)?;

        tracing::info!(owner_id, stats = ?result.stats(), "user chats merged");
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Create / update
    // ------------------------------------------------------------------

    /// Insert a chat with its properties, without linking it to anyone.
    pub fn create_chat(&mut self, chat: &Chat) -> Result<()> {
        self.apply_batch(&[
            StoreOp::InsertChat(chat.clone()),
            StoreOp::InsertChatProperties(chat.clone()),
        ])?;
        Ok(())
    }

    /// Update core fields and replace the property bag.
    ///
    /// Returns `false` (and touches nothing) when the chat is not stored.
    pub fn update_chat(&mut self, chat: &Chat) -> Result<bool> {
        let tx = self.conn_mut().transaction()?;
        let rows = StoreOp::UpdateChat(chat.clone()).exec(&tx)?;
        if rows == 0 {
            return Ok(false);
        }
        StoreOp::DeleteChatProperties {
            chat_id: chat.entity_id().to_string(),
        }
        .exec(&tx)?;
        StoreOp::InsertChatProperties(chat.clone()).exec(&tx)?;
        tx.commit()?;
        Ok(true)
    }

    /// Link a participant (or owner) to a stored chat
    pub fn link_chat(&self, user_id: &str, chat_id: &str) -> Result<bool> {
        let rows = StoreOp::InsertChatLink {
            user_id: user_id.to_string(),
            chat_id: chat_id.to_string(),
        }
        .exec(self.conn())?;
        Ok(rows > 0)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn read_chat(&self, chat_id: &str) -> Result<Chat> {
        let row = self
            .conn()
            .query_row(
                &format!("{SELECT_CHAT} WHERE id = ?1"),
                params![chat_id],
                row_to_chat_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound)?;
        row.into_chat(self.conn())
    }

    /// Chats linked to `user_id`, ordered by id
    pub fn read_chats_by_user(&self, user_id: &str) -> Result<Vec<Chat>> {
        let mut stmt = self.conn().prepare(&format!(
            "{SELECT_CHAT} WHERE id IN (SELECT chat_id FROM user_chats WHERE user_id = ?1)
             ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![user_id], row_to_chat_row)?;

        let mut chats = Vec::new();
        for row in rows {
            chats.push(row?.into_chat(self.conn())?);
        }
        Ok(chats)
    }

    pub fn read_chat_ids_by_user(&self, user_id: &str) -> Result<BTreeSet<String>> {
        self.read_linked_ids(LinkScope::Chats, user_id)
    }

    pub fn read_all_chat_ids(&self) -> Result<BTreeSet<String>> {
        self.read_all_known_ids(LinkScope::Chats)
    }

    pub fn read_chat_properties(&self, chat_id: &str) -> Result<Properties> {
        Ok(sql::read_properties(self.conn(), PropertyTable::Chat, chat_id)?)
    }

    /// Ids of every user linked to the chat, owners included
    pub fn read_participant_ids(&self, chat_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT user_id FROM user_chats WHERE chat_id = ?1 ORDER BY user_id ASC")?;
        let rows = stmt.query_map(params![chat_id], |row| row.get::<_, String>(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Number of unread messages per chat, for chats that have any
    pub fn unread_chats(&self) -> Result<HashMap<Entity, u32>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.account_id, c.account_entity_id, COUNT(*)
             FROM chats c JOIN messages m ON c.id = m.chat_id
             WHERE m.read = 0
             GROUP BY c.id, c.account_id, c.account_entity_id",
        )?;
        let rows = stmt.query_map([], |row| {
            let account_id: String = row.get(0)?;
            let account_entity_id: String = row.get(1)?;
            let unread: u32 = row.get(2)?;
            Ok((Entity::new(account_id, account_entity_id), unread))
        })?;

        let mut unread = HashMap::new();
        for row in rows {
            let (chat, count) = row?;
            if count > 0 {
                unread.insert(chat, count);
            }
        }
        Ok(unread)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Drop the link between `user_id` and the chat. The chat row stays.
    pub fn unlink_chat(&self, user_id: &str, chat_id: &str) -> Result<bool> {
        let rows = StoreOp::UnlinkChats {
            user_id: user_id.to_string(),
            chat_ids: vec![chat_id.to_string()],
        }
        .exec(self.conn())?;
        Ok(rows > 0)
    }

    // ON DELETE CASCADE: properties, links and messages go with it
    pub fn delete_chat(&self, chat_id: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM chats WHERE id = ?1", params![chat_id])?;
        Ok(affected > 0)
    }

    pub fn delete_all_chats(&mut self) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        tx.execute("DELETE FROM user_chats", [])?;
        tx.execute("DELETE FROM chat_properties", [])?;
        tx.execute("DELETE FROM messages", [])?;
        tx.execute("DELETE FROM chats", [])?;
        tx.commit()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Core columns of a chat; properties are loaded separately.
struct ChatRow {
    account_id: String,
    account_entity_id: String,
    messages_count: u32,
    last_messages_sync_date: Option<DateTime<Utc>>,
}

impl ChatRow {
    fn into_chat(self, conn: &Connection) -> Result<Chat> {
        let entity = Entity::new(self.account_id, self.account_entity_id);
        let properties = sql::read_properties(conn, PropertyTable::Chat, entity.entity_id())?;
        Ok(Chat::new(
            entity,
            self.messages_count,
            properties,
            self.last_messages_sync_date,
        ))
    }
}

fn row_to_chat_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatRow> {
    let sync_date: Option<String> = row.get(4)?;
    Ok(ChatRow {
        account_id: row.get(1)?,
        account_entity_id: row.get(2)?,
        messages_count: row.get(3)?,
        last_messages_sync_date: sync_date
            .map(|s| parse_timestamp(4, &s))
            .transpose()?,
    })
}
