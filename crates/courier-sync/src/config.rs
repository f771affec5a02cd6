//! Sync configuration loaded from environment variables.
//!
//! Every setting has a default so the service runs with zero configuration.

use std::path::PathBuf;

use courier_shared::constants::MAX_IN_COUNT;
use courier_store::{Database, MergePolicy};

/// Sync configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// SQLite database file.
    /// Env: `COURIER_DB_PATH`
    /// Default: `None`, the platform data directory + `courier.db`.
    pub database_path: Option<PathBuf>,

    /// Maximum number of ids bound into one `IN (...)` clause.
    /// Env: `COURIER_MAX_IN_COUNT` (must be > 0)
    /// Default: `900`
    pub max_in_count: usize,

    /// Whether remote fetches are complete snapshots of the owner's state.
    /// Env: `COURIER_FULL_RESYNC` (true/false)
    /// Default: `false`
    pub full_resync: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            max_in_count: MAX_IN_COUNT,
            full_resync: false,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SyncConfig::from_env`] with an explicit variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("COURIER_DB_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("COURIER_MAX_IN_COUNT") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_in_count = n,
                _ => {
                    tracing::warn!(value = %val, "Invalid COURIER_MAX_IN_COUNT, using default");
                }
            }
        }

        if let Some(val) = lookup("COURIER_FULL_RESYNC") {
            match val.to_ascii_lowercase().as_str() {
                "true" | "1" => config.full_resync = true,
                "false" | "0" => config.full_resync = false,
                _ => {
                    tracing::warn!(value = %val, "Invalid COURIER_FULL_RESYNC, using default");
                }
            }
        }

        config
    }

    /// Policy for scheduled account syncs
    pub fn merge_policy(&self) -> MergePolicy {
        if self.full_resync {
            MergePolicy::complete()
        } else {
            MergePolicy::partial()
        }
    }

    /// Open (and migrate) the configured database.
    pub fn open_database(&self) -> courier_store::Result<Database> {
        let db = match &self.database_path {
            Some(path) => Database::open_at(path)?,
            None => Database::new()?,
        };
        Ok(db.with_max_in_count(self.max_in_count))
    }
}
