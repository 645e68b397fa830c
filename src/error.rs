//! Error types for the Pokédex sync library.
//!
//! The binary converts these into `anyhow` at the CLI boundary; inside the
//! library every fallible path returns [`Result`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy for the sync pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// A local point lookup found no row. Only the local read path produces
    /// this; a remote 404 is reported as [`Error::Remote`] instead, so
    /// callers can tell "record absent" from "fetch failed".
    #[error("no local record with id {id}")]
    NotFound { id: i64 },

    /// The remote answered with a non-success status code.
    #[error("remote request failed (HTTP {status})")]
    Remote { status: u16 },

    /// Connect, timeout, or body-decode failure before any status arrived.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),
}
