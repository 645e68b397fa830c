//! In-memory [`PokemonStore`] implementation for tests.
//!
//! A `BTreeMap` behind `std::sync::RwLock`, so snapshots come out in the
//! same ascending-id order the SQLite store produces.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::Result;
use crate::models::{Pokemon, Snapshot};

use super::PokemonStore;

/// In-memory store for tests and ephemeral runs.
pub struct MemoryStore {
    rows: RwLock<BTreeMap<i64, Pokemon>>,
    revision: watch::Sender<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            rows: RwLock::new(BTreeMap::new()),
            revision,
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PokemonStore for MemoryStore {
    async fn upsert(&self, p: &Pokemon) -> Result<()> {
        self.rows.write().unwrap().insert(p.id, p.clone());
        self.bump();
        Ok(())
    }

    async fn upsert_all(&self, items: &[Pokemon]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        {
            let mut rows = self.rows.write().unwrap();
            for p in items {
                rows.insert(p.id, p.clone());
            }
        }
        self.bump();
        Ok(())
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.rows.read().unwrap().values().cloned().collect())
    }

    async fn lookup(&self, id: i64) -> Result<Option<Pokemon>> {
        Ok(self.rows.read().unwrap().get(&id).cloned())
    }

    fn revision(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mon(id: i64, name: &str) -> Pokemon {
        Pokemon {
            id,
            name: name.to_string(),
            sprite_url: String::new(),
            artwork_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_upsert_idempotent() {
        let store = MemoryStore::new();
        store.upsert(&mon(1, "bulbasaur")).await.unwrap();
        store.upsert(&mon(1, "ivysaur")).await.unwrap();

        let snap = store.snapshot().await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].name, "ivysaur");
    }

    #[tokio::test]
    async fn test_snapshot_orders_by_id() {
        let store = MemoryStore::new();
        store
            .upsert_all(&[mon(25, "pikachu"), mon(4, "charmander")])
            .await
            .unwrap();

        let ids: Vec<i64> = store
            .snapshot()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![4, 25]);
    }

    #[tokio::test]
    async fn test_revision_signal_fires_on_upsert() {
        let store = MemoryStore::new();
        let mut rx = store.revision();

        store.upsert(&mon(1, "bulbasaur")).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
    }
}
