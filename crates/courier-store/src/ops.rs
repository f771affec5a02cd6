//! Primitive storage operations produced by the batch planner.
//!
//! Each [`StoreOp`] touches a single table. Core rows (`chats`, `users`,
//! `messages`) are inserted with a plain `INSERT`, so an id conflict surfaces
//! as an error and aborts the batch. Link rows are idempotent.

use courier_shared::{Chat, EntityAware, Message, User};
use rusqlite::{params, params_from_iter, Connection};

use crate::sql::{self, in_clause, PropertyTable};

#[derive(Debug, Clone)]
pub enum StoreOp {
    InsertChat(Chat),
    UpdateChat(Chat),
    DeleteChatProperties { chat_id: String },
    InsertChatProperties(Chat),
    InsertChatLink { user_id: String, chat_id: String },
    /// Drop the links between `user_id` and every chat in `chat_ids`
    UnlinkChats { user_id: String, chat_ids: Vec<String> },
    InsertMessage { chat_id: String, message: Message },

    InsertUser(User),
    UpdateUser(User),
    DeleteUserProperties { user_id: String },
    InsertUserProperties(User),
    InsertContactLink { user_id: String, contact_id: String },
    UnlinkContacts { user_id: String, contact_ids: Vec<String> },
}

impl StoreOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InsertChat(_) => "insert_chat",
            Self::UpdateChat(_) => "update_chat",
            Self::DeleteChatProperties { .. } => "delete_chat_properties",
            Self::InsertChatProperties(_) => "insert_chat_properties",
            Self::InsertChatLink { .. } => "insert_chat_link",
            Self::UnlinkChats { .. } => "unlink_chats",
            Self::InsertMessage { .. } => "insert_message",
            Self::InsertUser(_) => "insert_user",
            Self::UpdateUser(_) => "update_user",
            Self::DeleteUserProperties { .. } => "delete_user_properties",
            Self::InsertUserProperties(_) => "insert_user_properties",
            Self::InsertContactLink { .. } => "insert_contact_link",
            Self::UnlinkContacts { .. } => "unlink_contacts",
        }
    }

    /// Run the operation. Returns the number of affected rows.
    pub fn exec(&self, conn: &Connection) -> rusqlite::Result<usize> {
        match self {
            Self::InsertChat(chat) => conn.execute(
                "INSERT INTO chats (id, account_id, account_entity_id, messages_count, last_messages_sync_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    chat.entity_id(),
                    chat.entity().account_id(),
                    chat.entity().account_entity_id(),
                    chat.messages_count(),
                    chat.last_messages_sync_date().map(|d| d.to_rfc3339()),
                ],
            ),
            Self::UpdateChat(chat) => conn.execute(
                "UPDATE chats
                 SET account_id = ?2, account_entity_id = ?3, messages_count = ?4, last_messages_sync_date = ?5
                 WHERE id = ?1",
                params![
                    chat.entity_id(),
                    chat.entity().account_id(),
                    chat.entity().account_entity_id(),
                    chat.messages_count(),
                    chat.last_messages_sync_date().map(|d| d.to_rfc3339()),
                ],
            ),
            Self::DeleteChatProperties { chat_id } => {
                sql::delete_properties(conn, PropertyTable::Chat, chat_id)
            }
            Self::InsertChatProperties(chat) => {
                sql::insert_properties(conn, PropertyTable::Chat, chat.entity_id(), chat.properties())
            }
            Self::InsertChatLink { user_id, chat_id } => conn.execute(
                "INSERT OR IGNORE INTO user_chats (user_id, chat_id) VALUES (?1, ?2)",
                params![user_id, chat_id],
            ),
            Self::UnlinkChats { user_id, chat_ids } => {
                if chat_ids.is_empty() {
                    return Ok(0);
                }
                let sql = format!(
                    "DELETE FROM user_chats WHERE user_id = ? AND chat_id IN {}",
                    in_clause(chat_ids.len())
                );
                conn.execute(
                    &sql,
                    params_from_iter(std::iter::once(user_id).chain(chat_ids.iter())),
                )
            }
            Self::InsertMessage { chat_id, message } => conn.execute(
                "INSERT INTO messages (id, chat_id, account_id, account_entity_id, author_id, recipient_id, body, send_date, read)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    message.entity_id(),
                    chat_id,
                    message.entity.account_id(),
                    message.entity.account_entity_id(),
                    message.author.entity_id(),
                    message.recipient.entity_id(),
                    message.body,
                    message.send_date.to_rfc3339(),
                    message.read,
                ],
            ),
            Self::InsertUser(user) => conn.execute(
                "INSERT INTO users (id, account_id, account_entity_id, realm_def_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.entity_id(),
                    user.entity().account_id(),
                    user.entity().account_entity_id(),
                    user.entity().realm_def_id(),
                ],
            ),
            Self::UpdateUser(user) => conn.execute(
                "UPDATE users SET account_id = ?2, account_entity_id = ?3, realm_def_id = ?4
                 WHERE id = ?1",
                params![
                    user.entity_id(),
                    user.entity().account_id(),
                    user.entity().account_entity_id(),
                    user.entity().realm_def_id(),
                ],
            ),
            Self::DeleteUserProperties { user_id } => {
                sql::delete_properties(conn, PropertyTable::User, user_id)
            }
            Self::InsertUserProperties(user) => {
                sql::insert_properties(conn, PropertyTable::User, user.entity_id(), user.properties())
            }
            Self::InsertContactLink {
                user_id,
                contact_id,
            } => conn.execute(
                "INSERT OR IGNORE INTO user_contacts (user_id, contact_id) VALUES (?1, ?2)",
                params![user_id, contact_id],
            ),
            Self::UnlinkContacts {
                user_id,
                contact_ids,
            } => {
                if contact_ids.is_empty() {
                    return Ok(0);
                }
                let sql = format!(
                    "DELETE FROM user_contacts WHERE user_id = ? AND contact_id IN {}",
                    in_clause(contact_ids.len())
                );
                conn.execute(
                    &sql,
                    params_from_iter(std::iter::once(user_id).chain(contact_ids.iter())),
                )
            }
        }
    }
}
