//! Small helpers shared by the query modules.

use chrono::{DateTime, Utc};
use courier_shared::{Entity, Properties, Property};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

/// `(?, ?, ?)` with `count` placeholders
pub(crate) fn in_clause(count: usize) -> String {
    let mut clause = String::with_capacity(2 + count * 3);
    clause.push('(');
    for i in 0..count {
        if i > 0 {
            clause.push_str(", ");
        }
        clause.push('?');
    }
    clause.push(')');
    clause
}

pub(crate) fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

pub(crate) fn parse_entity(column: usize, value: &str) -> rusqlite::Result<Entity> {
    Entity::from_entity_id(value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Text,
            format!("invalid entity id: {value}").into(),
        )
    })
}

/// Read the property bag stored for `owner_id` in `table`, in insertion order
pub(crate) fn read_properties(
    conn: &Connection,
    table: PropertyTable,
    owner_id: &str,
) -> rusqlite::Result<Properties> {
    let sql = format!(
        "SELECT property_name, property_value FROM {} WHERE {} = ?1 ORDER BY rowid ASC",
        table.name(),
        table.owner_column()
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![owner_id], |row| {
        Ok(Property {
            name: row.get(0)?,
            value: row.get(1)?,
        })
    })?;
    rows.collect()
}

pub(crate) fn delete_properties(
    conn: &Connection,
    table: PropertyTable,
    owner_id: &str,
) -> rusqlite::Result<usize> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1",
        table.name(),
        table.owner_column()
    );
    conn.execute(&sql, params![owner_id])
}

pub(crate) fn insert_properties(
    conn: &Connection,
    table: PropertyTable,
    owner_id: &str,
    properties: &Properties,
) -> rusqlite::Result<usize> {
    let sql = format!(
        "INSERT INTO {} ({}, property_name, property_value) VALUES (?1, ?2, ?3)",
        table.name(),
        table.owner_column()
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let mut inserted = 0;
    for property in properties {
        inserted += stmt.execute(params![owner_id, property.name, property.value])?;
    }
    Ok(inserted)
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum PropertyTable {
    Chat,
    User,
}

impl PropertyTable {
    fn name(self) -> &'static str {
        match self {
            Self::Chat => "chat_properties",
            Self::User => "user_properties",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            Self::Chat => "chat_id",
            Self::User => "user_id",
        }
    }
}
