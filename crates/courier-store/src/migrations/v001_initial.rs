//! v001 -- Initial schema creation.
//!
//! Users and chats each get a core table plus a property table; owner links
//! live in `user_contacts` and `user_chats`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id                TEXT PRIMARY KEY NOT NULL,  -- derived entity id
    account_id        TEXT NOT NULL,
    account_entity_id TEXT NOT NULL,
    realm_def_id      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_properties (
    user_id        TEXT NOT NULL,                 -- FK -> users(id)
    property_name  TEXT NOT NULL,
    property_value TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_user_properties_user_id ON user_properties(user_id);

-- owner -> contact
CREATE TABLE IF NOT EXISTS user_contacts (
    user_id    TEXT NOT NULL,
    contact_id TEXT NOT NULL,                     -- FK -> users(id)

    PRIMARY KEY (user_id, contact_id),
    FOREIGN KEY (contact_id) REFERENCES users(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Chats
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chats (
    id                      TEXT PRIMARY KEY NOT NULL,  -- derived entity id
    account_id              TEXT NOT NULL,
    account_entity_id       TEXT NOT NULL,
    messages_count          INTEGER NOT NULL DEFAULT 0,
    last_messages_sync_date TEXT                        -- RFC-3339, nullable
);

CREATE TABLE IF NOT EXISTS chat_properties (
    chat_id        TEXT NOT NULL,                 -- FK -> chats(id)
    property_name  TEXT NOT NULL,
    property_value TEXT NOT NULL,

    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_chat_properties_chat_id ON chat_properties(chat_id);

-- participant/owner -> chat
CREATE TABLE IF NOT EXISTS user_chats (
    user_id TEXT NOT NULL,
    chat_id TEXT NOT NULL,                        -- FK -> chats(id)

    PRIMARY KEY (user_id, chat_id),
    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_user_chats_chat_id ON user_chats(chat_id);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id                TEXT PRIMARY KEY NOT NULL,  -- derived entity id
    chat_id           TEXT NOT NULL,              -- FK -> chats(id)
    account_id        TEXT NOT NULL,
    account_entity_id TEXT NOT NULL,
    author_id         TEXT NOT NULL,              -- entity id
    recipient_id      TEXT NOT NULL,              -- entity id
    body              TEXT NOT NULL,
    send_date         TEXT NOT NULL,              -- RFC-3339
    read              INTEGER NOT NULL DEFAULT 0, -- boolean 0/1

    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_chat_send_date
    ON messages(chat_id, send_date ASC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
