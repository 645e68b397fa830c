//! Storage abstraction for the local Pokédex.
//!
//! The [`PokemonStore`] trait defines the keyed table the sync coordinator
//! writes into and observers read out of, enabling pluggable backends
//! (SQLite in production, in-memory for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::Result;
use crate::models::{Pokemon, Snapshot};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Keyed persistent table of canonical records.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](PokemonStore::upsert) | Insert or replace one record by id |
/// | [`upsert_all`](PokemonStore::upsert_all) | Insert or replace a batch in order |
/// | [`snapshot`](PokemonStore::snapshot) | Read all rows, ascending id |
/// | [`lookup`](PokemonStore::lookup) | Point read by id |
/// | [`revision`](PokemonStore::revision) | Change-notification signal |
///
/// Upserts are idempotent: writing the same `id` twice replaces fields in
/// place and never duplicates the row. Implementations own their internal
/// synchronization; `upsert` must be safe to call from concurrent tasks.
#[async_trait]
pub trait PokemonStore: Send + Sync {
    /// Insert or replace one record.
    async fn upsert(&self, p: &Pokemon) -> Result<()>;

    /// Insert or replace a batch, in the given order.
    ///
    /// Bumps the revision at least once per batch; callers must not assume
    /// one bump per row.
    async fn upsert_all(&self, items: &[Pokemon]) -> Result<()>;

    /// Point-in-time read of all rows, ascending by id.
    async fn snapshot(&self) -> Result<Snapshot>;

    /// Point read. Absence is `Ok(None)`, not an error, at this layer.
    async fn lookup(&self, id: i64) -> Result<Option<Pokemon>>;

    /// Change-notification signal: a counter bumped after every mutating
    /// call. Receivers await [`watch::Receiver::changed`] and re-read
    /// [`snapshot`](PokemonStore::snapshot); bursts may coalesce, but the
    /// snapshot read after the last bump reflects every completed upsert.
    fn revision(&self) -> watch::Receiver<u64>;
}
