use rusqlite::Connection;

// Unread counters scan messages by read flag
const UP_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_messages_unread ON messages(chat_id) WHERE read = 0;
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
