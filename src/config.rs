//! TOML configuration for the `dex` binary and library constructors.
//!
//! Every key is optional; a missing file or empty table yields the defaults
//! below, which point at the public PokeAPI and a `dex.db` in the working
//! directory.
//!
//! ```toml
//! [remote]
//! base_url = "https://pokeapi.co"
//! page_limit = 20
//! page_offset = 0
//! detail_concurrency = 4
//! timeout_secs = 30
//!
//! [db]
//! path = "dex.db"
//!
//! [stream]
//! grace_ms = 5000
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Base host for the remote API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Page size for the summary listing. One page only; there is no
    /// follow-the-next-link pagination.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default)]
    pub page_offset: u32,
    /// Worker bound for the per-item detail fan-out.
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_limit: default_page_limit(),
            page_offset: 0,
            detail_concurrency: default_detail_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://pokeapi.co".to_string()
}
fn default_page_limit() -> u32 {
    20
}
fn default_detail_concurrency() -> usize {
    4
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("dex.db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct StreamConfig {
    /// How long the snapshot hub keeps its store subscription warm after
    /// the last observer leaves, in milliseconds.
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            grace_ms: default_grace_ms(),
        }
    }
}

fn default_grace_ms() -> u64 {
    5000
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.remote.base_url.trim().is_empty() {
        return Err(Error::Config("remote.base_url must not be empty".into()));
    }
    if config.remote.page_limit == 0 {
        return Err(Error::Config("remote.page_limit must be > 0".into()));
    }
    if config.remote.detail_concurrency == 0 {
        return Err(Error::Config(
            "remote.detail_concurrency must be > 0".into(),
        ));
    }
    if config.db.path.as_os_str().is_empty() {
        return Err(Error::Config("db.path must not be empty".into()));
    }
    Ok(())
}
