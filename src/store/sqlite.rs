//! SQLite-backed [`PokemonStore`] implementation.
//!
//! Wraps a [`SqlitePool`] and translates every store operation into SQL
//! against the `pokemon` table created by [`crate::migrate`]. The revision
//! counter lives in process memory, not in the database: observers belong
//! to the process that owns the pool.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tokio::sync::watch;

use crate::error::Result;
use crate::models::{Pokemon, Snapshot};

use super::PokemonStore;

/// SQLite implementation of the [`PokemonStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
    revision: watch::Sender<u64>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (revision, _) = watch::channel(0);
        Self { pool, revision }
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

#[async_trait]
impl PokemonStore for SqliteStore {
    async fn upsert(&self, p: &Pokemon) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pokemon (id, name, sprite_url, artwork_url)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                sprite_url = excluded.sprite_url,
                artwork_url = excluded.artwork_url
            "#,
        )
        .bind(p.id)
        .bind(&p.name)
        .bind(&p.sprite_url)
        .bind(&p.artwork_url)
        .execute(&self.pool)
        .await?;

        self.bump();
        Ok(())
    }

    async fn upsert_all(&self, items: &[Pokemon]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for p in items {
            sqlx::query(
                r#"
                INSERT INTO pokemon (id, name, sprite_url, artwork_url)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    sprite_url = excluded.sprite_url,
                    artwork_url = excluded.artwork_url
                "#,
            )
            .bind(p.id)
            .bind(&p.name)
            .bind(&p.sprite_url)
            .bind(&p.artwork_url)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.bump();
        Ok(())
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let rows = sqlx::query("SELECT id, name, sprite_url, artwork_url FROM pokemon ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Pokemon {
                id: row.get("id"),
                name: row.get("name"),
                sprite_url: row.get("sprite_url"),
                artwork_url: row.get("artwork_url"),
            })
            .collect())
    }

    async fn lookup(&self, id: i64) -> Result<Option<Pokemon>> {
        let row = sqlx::query("SELECT id, name, sprite_url, artwork_url FROM pokemon WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Pokemon {
            id: row.get("id"),
            name: row.get("name"),
            sprite_url: row.get("sprite_url"),
            artwork_url: row.get("artwork_url"),
        }))
    }

    fn revision(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
