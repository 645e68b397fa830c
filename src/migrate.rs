//! Schema migrations.
//!
//! One fixed version: the `pokemon` table keyed by the remote's numeric id.
//! Re-running is safe.

use sqlx::SqlitePool;

use crate::error::Result;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pokemon (
            id          INTEGER PRIMARY KEY,
            name        TEXT NOT NULL,
            sprite_url  TEXT NOT NULL,
            artwork_url TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
