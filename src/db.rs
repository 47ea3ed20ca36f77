//! Connection pool for the jar database.
//!
//! Connections enforce foreign keys, so a call can never point at a jar that
//! is gone. The journal runs in WAL mode: `GET /cookies` lookups keep reading
//! while an outcome report writes.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::Config;

const MAX_CONNECTIONS: u32 = 5;

/// Open (creating if needed) the database at `config.db.path`.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open jar database: {}", db_path.display()))
}
