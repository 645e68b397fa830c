//! # Pokédex Sync CLI (`dex`)
//!
//! The `dex` binary is the outer surface of the offline-first Pokédex
//! cache. It keeps a local SQLite table in sync with PokeAPI and offers
//! both cached and live read paths.
//!
//! ## Usage
//!
//! ```bash
//! dex --config ./dex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dex init` | Create the SQLite database and run schema migrations |
//! | `dex sync` | Run one foreground refresh from the remote |
//! | `dex snapshot` | Print the local table without touching the network |
//! | `dex watch` | Follow the snapshot stream; `--interval` adds periodic refresh |
//! | `dex list` | Live listing straight from the remote (uncached) |
//! | `dex get <id>` | Live point read from the remote; `--local` reads the store |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! dex init
//!
//! # Pull the first page and hydrate it
//! dex sync
//!
//! # What does the cache hold right now?
//! dex snapshot
//!
//! # Watch the cache live, refreshing every 30 seconds
//! dex watch --interval 30
//!
//! # Live remote read, bypassing the cache
//! dex get 25
//!
//! # Local point read; exits with an error when the row is absent
//! dex get 25 --local
//! ```
//!
//! A missing config file is not an error: every setting has a default (see
//! [`pokedex_sync::config`]).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pokedex_sync::{config, db, migrate, Config, Pokemon, RemoteSource, Repository, SqliteStore};

/// Pokédex Sync CLI: an offline-first cache over PokeAPI.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file falls back to built-in defaults.
#[derive(Parser)]
#[command(
    name = "dex",
    about = "Pokédex Sync — an offline-first Pokémon cache over PokeAPI",
    version,
    long_about = "Pokédex Sync keeps a local SQLite table of Pokémon in step with PokeAPI. \
    A refresh fetches one summary page, hydrates every entry with its detail record, and \
    upserts the results; observers follow the table through a shared snapshot stream that \
    never waits on the network."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./dex.toml`. Remote, database, and stream settings are
    /// read from this file; absent keys keep their defaults.
    #[arg(long, global = true, default_value = "./dex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `pokemon` table. This
    /// command is idempotent; running it multiple times is safe.
    Init,

    /// Run one foreground refresh.
    ///
    /// Fetches the summary page, hydrates each entry with a detail
    /// request, and upserts the survivors into the local table. Detail
    /// failures drop the affected entry; a summary failure aborts the
    /// sync with an error.
    Sync,

    /// Print the local table, no network involved.
    Snapshot {
        /// Emit JSON instead of the plain listing.
        #[arg(long)]
        json: bool,
    },

    /// Follow the snapshot stream until Ctrl-C.
    ///
    /// Subscribing schedules one background refresh; every store change
    /// prints the new snapshot.
    Watch {
        /// Additionally trigger a background refresh every N seconds.
        /// Refreshes are skipped while a previous one is still running.
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Live listing from the remote. Bypasses the local table entirely.
    List {
        /// Emit JSON instead of the plain listing.
        #[arg(long)]
        json: bool,
    },

    /// Read one record by id.
    ///
    /// By default this is a live remote read that bypasses the local
    /// table; a remote 404 is reported as an HTTP failure. With
    /// `--local` the store is consulted instead and an absent row is a
    /// not-found error.
    Get {
        /// Numeric record id.
        id: i64,

        /// Read from the local table instead of the remote.
        #[arg(long)]
        local: bool,

        /// Emit JSON instead of the record block.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg.db).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Sync => {
            let repo = build_repository(&cfg).await?;
            println!("sync {}", cfg.remote.base_url);
            let count = repo.refresh().await?;
            println!("  upserted: {} records", count);
            println!("ok");
        }
        Commands::Snapshot { json } => {
            let repo = build_repository(&cfg).await?;
            let snap = repo.snapshot().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snap)?);
            } else {
                print_listing(&snap);
            }
        }
        Commands::Watch { interval } => {
            let repo = build_repository(&cfg).await?;
            run_watch(&repo, interval).await?;
        }
        Commands::List { json } => {
            let repo = build_repository(&cfg).await?;
            let records = repo.read_all().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_listing(&records);
            }
        }
        Commands::Get { id, local, json } => {
            let repo = build_repository(&cfg).await?;
            let record = if local {
                repo.lookup_local(id).await?
            } else {
                repo.read_one(id).await?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_record(&record);
            }
        }
    }

    Ok(())
}

/// Open the database, make sure the schema exists, and wire the repository.
async fn build_repository(cfg: &Config) -> anyhow::Result<Repository> {
    let pool = db::connect(&cfg.db).await?;
    migrate::run_migrations(&pool).await?;

    let store = Arc::new(SqliteStore::new(pool));
    let remote = Arc::new(RemoteSource::new(&cfg.remote)?);
    let grace = Duration::from_millis(cfg.stream.grace_ms);

    Ok(Repository::new(remote, store, grace))
}

fn print_listing(records: &[Pokemon]) {
    if records.is_empty() {
        println!("No records.");
        return;
    }
    for p in records {
        println!("{:>5}  {}", p.id, p.name);
    }
    println!("{} records", records.len());
}

fn print_record(p: &Pokemon) {
    println!("--- Record ---");
    println!("id:      {}", p.id);
    println!("name:    {}", p.name);
    println!("sprite:  {}", display_url(&p.sprite_url));
    println!("artwork: {}", display_url(&p.artwork_url));
}

fn display_url(url: &str) -> &str {
    if url.is_empty() {
        "(none)"
    } else {
        url
    }
}

/// Print every emitted snapshot until Ctrl-C, optionally driving a
/// periodic background refresh.
async fn run_watch(repo: &Repository, interval: Option<u64>) -> anyhow::Result<()> {
    let mut sub = repo.observe();

    // First tick is delayed by one period; observe() already scheduled the
    // initial refresh.
    let mut ticker = interval.map(|secs| {
        let period = Duration::from_secs(secs);
        tokio::time::interval_at(tokio::time::Instant::now() + period, period)
    });

    println!("watching (Ctrl-C to stop)");
    loop {
        tokio::select! {
            emitted = sub.recv() => {
                match emitted {
                    Some(snap) => {
                        println!("snapshot: {} records", snap.len());
                        for p in &snap {
                            println!("{:>5}  {}", p.id, p.name);
                        }
                        println!();
                    }
                    None => break,
                }
            }
            _ = async {
                match ticker.as_mut() {
                    Some(t) => {
                        t.tick().await;
                    }
                    None => std::future::pending().await,
                }
            } => {
                if !repo.schedule_refresh() {
                    println!("  refresh skipped (previous still running)");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("stopped");
                break;
            }
        }
    }

    Ok(())
}
