use courier_shared::{EntityAware, Message};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::ops::StoreOp;
use crate::sql::{parse_entity, parse_timestamp};

const SELECT_MESSAGE: &str =
    "SELECT id, author_id, recipient_id, body, send_date, read FROM messages";

impl Database {
    pub fn insert_message(&self, chat_id: &str, message: &Message) -> Result<()> {
        StoreOp::InsertMessage {
            chat_id: chat_id.to_string(),
            message: message.clone(),
        }
        .exec(self.conn())?;
        Ok(())
    }

    /// Messages of a chat, oldest first
    pub fn messages_for_chat(&self, chat_id: &str) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "{SELECT_MESSAGE} WHERE chat_id = ?1 ORDER BY send_date ASC, id ASC"
        ))?;

        let rows = stmt.query_map(params![chat_id], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub fn read_message(&self, message_id: &str) -> Result<Message> {
        self.conn()
            .query_row(
                &format!("{SELECT_MESSAGE} WHERE id = ?1"),
                params![message_id],
                row_to_message,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    pub fn mark_message_read(&self, message_id: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE messages SET read = 1 WHERE id = ?1 AND read = 0",
            params![message_id],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id: String = row.get(0)?;
    let author: String = row.get(1)?;
    let recipient: String = row.get(2)?;
    let body: String = row.get(3)?;
    let send_date: String = row.get(4)?;
    let read: bool = row.get(5)?;

    Ok(Message {
        entity: parse_entity(0, &id)?,
        author: parse_entity(1, &author)?,
        recipient: parse_entity(2, &recipient)?,
        body,
        send_date: parse_timestamp(4, &send_date)?,
        read,
    })
}
