//! The offline-first repository: one write path from the remote into the
//! store, one observation path out of it.
//!
//! `observe()` never blocks on the network. It hands out the hub's shared
//! stream immediately and schedules a detached refresh; whatever that
//! refresh does, observers keep receiving local snapshots. A failed refresh
//! is logged and swallowed, so the only way a caller ever sees a network
//! error is through the two bypass reads, which go straight to the remote
//! and never touch the store.
//!
//! At most one scheduled refresh runs at a time. Calls to `observe()` (or
//! [`Repository::schedule_refresh`]) while one is in flight do not stack a
//! second; the foreground [`Repository::refresh`] is deliberately exempt so
//! an explicit sync always runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Result;
use crate::hub::{SnapshotHub, Subscription};
use crate::models::{Pokemon, Snapshot};
use crate::source::{LocalSource, PokemonSource};
use crate::store::PokemonStore;

/// Coordinates the remote source, the local store, and the snapshot hub.
pub struct Repository {
    remote: Arc<dyn PokemonSource>,
    local: LocalSource,
    store: Arc<dyn PokemonStore>,
    hub: SnapshotHub,
    refresh_inflight: Arc<AtomicBool>,
}

impl Repository {
    /// Wire a repository over the given remote and store.
    ///
    /// `grace` is how long the hub keeps its store subscription warm after
    /// the last observer leaves. Must be called from within a Tokio
    /// runtime.
    pub fn new(
        remote: Arc<dyn PokemonSource>,
        store: Arc<dyn PokemonStore>,
        grace: Duration,
    ) -> Self {
        let hub = SnapshotHub::new(Arc::clone(&store), grace);
        let local = LocalSource::new(Arc::clone(&store));
        Self {
            remote,
            local,
            store,
            hub,
            refresh_inflight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to the local store's snapshot stream.
    ///
    /// Returns immediately; as a side effect a background refresh is
    /// scheduled (unless one is already running). The stream starts with
    /// the current snapshot and re-emits on every store change. It never
    /// carries an error: a failing remote leaves it on stale data.
    pub fn observe(&self) -> Subscription {
        let sub = self.hub.subscribe();
        self.schedule_refresh();
        sub
    }

    /// Schedule a detached background refresh.
    ///
    /// Returns `false` when a previously scheduled refresh is still in
    /// flight, in which case nothing new is spawned.
    pub fn schedule_refresh(&self) -> bool {
        if self
            .refresh_inflight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("refresh already in flight; not scheduling another");
            return false;
        }

        let remote = Arc::clone(&self.remote);
        let store = Arc::clone(&self.store);
        let inflight = Arc::clone(&self.refresh_inflight);
        tokio::spawn(async move {
            match refresh_into(remote.as_ref(), store.as_ref()).await {
                Ok(count) => debug!(count, "background refresh complete"),
                Err(e) => {
                    warn!(error = %e, "background refresh failed; observers keep local data");
                }
            }
            inflight.store(false, Ordering::Release);
        });
        true
    }

    /// Fetch the remote page and upsert every hydrated record.
    ///
    /// Foreground variant used by `dex sync`; errors propagate to the
    /// caller and the single-flight guard is not consulted.
    pub async fn refresh(&self) -> Result<usize> {
        refresh_into(self.remote.as_ref(), self.store.as_ref()).await
    }

    /// Live bulk read from the remote. Bypasses the store entirely: the
    /// result is not cached and observers see nothing.
    pub async fn read_all(&self) -> Result<Vec<Pokemon>> {
        self.remote.read_all().await
    }

    /// Live point read from the remote. Also uncached; a remote 404 comes
    /// back as [`Error::Remote`](crate::error::Error::Remote), not
    /// `NotFound`.
    pub async fn read_one(&self, id: i64) -> Result<Pokemon> {
        self.remote.read_one(id).await
    }

    /// Point read against the local store only. A missing row is
    /// [`Error::NotFound`](crate::error::Error::NotFound).
    pub async fn lookup_local(&self, id: i64) -> Result<Pokemon> {
        self.local.read_one(id).await
    }

    /// Current local snapshot, no network involved.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.local.read_all().await
    }
}

/// One refresh pass: remote page in, hydrated records upserted in returned
/// order. Returns how many records were written.
async fn refresh_into(remote: &dyn PokemonSource, store: &dyn PokemonStore) -> Result<usize> {
    let records = remote.read_all().await?;
    let count = records.len();
    store.upsert_all(&records).await?;
    Ok(count)
}
