//! The read contract shared by the remote and local data sources.
//!
//! The original design had two interchangeable sources behind one interface,
//! selected by qualifier at construction time. Here that is an explicit
//! trait with two concrete implementations chosen at composition time:
//! [`RemoteSource`](crate::remote::RemoteSource) reads the network,
//! [`LocalSource`] reads whatever the store currently holds.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Pokemon;
use crate::store::PokemonStore;

/// Bulk and point reads over one source of Pokémon records.
#[async_trait]
pub trait PokemonSource: Send + Sync {
    /// Fetch every record this source can currently produce.
    async fn read_all(&self) -> Result<Vec<Pokemon>>;

    /// Fetch one record by id.
    ///
    /// The local implementation reports a missing row as
    /// [`Error::NotFound`]; the remote one reports whatever HTTP failure
    /// occurred, even when that failure is a 404.
    async fn read_one(&self, id: i64) -> Result<Pokemon>;
}

/// Store-backed [`PokemonSource`]: reads are served from the local table
/// and never touch the network.
pub struct LocalSource {
    store: Arc<dyn PokemonStore>,
}

impl LocalSource {
    pub fn new(store: Arc<dyn PokemonStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PokemonSource for LocalSource {
    async fn read_all(&self) -> Result<Vec<Pokemon>> {
        self.store.snapshot().await
    }

    async fn read_one(&self, id: i64) -> Result<Pokemon> {
        self.store
            .lookup(id)
            .await?
            .ok_or(Error::NotFound { id })
    }
}
