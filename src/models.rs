//! Core data models used throughout the Pokédex sync pipeline.
//!
//! These types represent the records that flow from the remote API into the
//! local store and out to observers.

use serde::Serialize;

/// A fully hydrated Pokémon record as persisted in the local store.
///
/// Identity is `id`; every other field is replaced wholesale on re-sync
/// (last-writer-wins). Sprite URLs the remote does not provide are stored
/// as empty strings rather than NULLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pokemon {
    /// Stable numeric identifier assigned by the remote service.
    pub id: i64,
    pub name: String,
    /// Default front sprite, possibly empty.
    pub sprite_url: String,
    /// Official artwork rendition, possibly empty.
    pub artwork_url: String,
}

/// Full ordered read of all current records, ascending by `id`.
pub type Snapshot = Vec<Pokemon>;
