//! # Pokédex Sync
//!
//! An offline-first Pokédex cache. One background refresh pulls a summary
//! page from PokeAPI, hydrates every entry with its detail record, and
//! upserts the results into a local SQLite table; observers watch that
//! table through a shared snapshot stream and never wait on the network.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   read_all()   ┌──────────────┐   upsert_all   ┌─────────┐
//! │   PokeAPI    │───────────────▶│  Repository  │───────────────▶│ SQLite  │
//! │ page+details │                │  (refresh)   │                │ pokemon │
//! └──────────────┘                └──────┬───────┘                └────┬────┘
//!        ▲                               │ observe()                  │ revision
//!        │ bypass read_all/read_one      ▼                            ▼
//!        │                        ┌──────────────┐  replay-1   ┌─────────────┐
//!        └────────────────────────│  CLI (dex)   │◀────────────│ SnapshotHub │
//!                                 └──────────────┘             └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dex init                 # create the database
//! dex sync                 # one foreground refresh from PokeAPI
//! dex snapshot             # print the local table, no network
//! dex watch                # follow the snapshot stream live
//! dex get 1 --local        # local point read (NotFound when absent)
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`source`] | Read contract shared by remote and local sources |
//! | [`remote`] | PokeAPI client with lenient detail fan-out |
//! | [`store`] | Keyed local store (SQLite, in-memory) |
//! | [`hub`] | Replay-one multicast with grace-period teardown |
//! | [`repo`] | The offline-first repository |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod error;
pub mod hub;
pub mod migrate;
pub mod models;
pub mod remote;
pub mod repo;
pub mod source;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use hub::{SnapshotHub, Subscription};
pub use models::{Pokemon, Snapshot};
pub use remote::RemoteSource;
pub use repo::Repository;
pub use source::{LocalSource, PokemonSource};
pub use store::{MemoryStore, PokemonStore, SqliteStore};
