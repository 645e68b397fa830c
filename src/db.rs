//! SQLite connection handling.
//!
//! Observers re-read the full snapshot on every change signal, so the pool
//! is tuned for that read-mostly pattern: WAL journaling with normal
//! synchronous mode.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;

use crate::config::DbConfig;
use crate::error::{Error, Result};

/// Open (creating if necessary) the database file named by the config.
pub async fn connect(config: &DbConfig) -> Result<SqlitePool> {
    // The file may live in a directory that does not exist yet.
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
