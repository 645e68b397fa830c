//! Shared snapshot stream with replay and grace-period teardown.
//!
//! [`SnapshotHub`] multiplexes the store's change signal to any number of
//! observers. All of them share one upstream task holding one subscription
//! to the store; none of them triggers a duplicate query. The latest
//! emission is kept in a replay slot, so a late subscriber immediately sees
//! the current snapshot instead of waiting for the next change.
//!
//! The upstream task moves through three states:
//!
//! ```text
//!             first subscriber            last subscriber leaves
//!   ┌────────┐ ──────────────▶ ┌────────┐ ──────────────▶ ┌─────────┐
//!   │ Parked │                 │  Live  │                 │  Grace  │
//!   └────────┘ ◀────────────── └────────┘ ◀────────────── └─────────┘
//!        ▲       grace expired       subscriber returns
//!        └───────────────────────────────────────────────────┘
//! ```
//!
//! While Live or in Grace, every revision bump re-reads the snapshot and
//! publishes it. Grace keeps the subscription warm across a quick
//! unsubscribe/resubscribe cycle; only after it expires does the task park,
//! and the next subscriber re-primes the slot with a fresh read.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::warn;

use crate::models::Snapshot;
use crate::store::PokemonStore;

/// Replay-one multicast over the store's change notifications.
pub struct SnapshotHub {
    slot: watch::Sender<Option<Snapshot>>,
    subscribers: watch::Sender<usize>,
}

/// One observer's handle on the shared stream.
///
/// Dropping it unsubscribes; the hub keeps the upstream warm for the grace
/// period in case a new subscriber arrives.
pub struct Subscription {
    rx: watch::Receiver<Option<Snapshot>>,
    _guard: SubscriberGuard,
}

struct SubscriberGuard {
    subscribers: watch::Sender<usize>,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.subscribers.send_modify(|n| *n -= 1);
    }
}

impl SnapshotHub {
    /// Spawn the upstream task and return the hub.
    ///
    /// Must be called from within a Tokio runtime. The task lives until the
    /// hub and every outstanding [`Subscription`] are gone.
    pub fn new(store: Arc<dyn PokemonStore>, grace: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        let (subscribers, sub_rx) = watch::channel(0usize);

        tokio::spawn(upstream(store, slot.clone(), sub_rx, grace));

        Self { slot, subscribers }
    }

    /// Register a new observer.
    ///
    /// The subscription's first [`recv`](Subscription::recv) resolves
    /// immediately with the replayed snapshot when one exists; otherwise it
    /// waits for the prime read the arrival of this subscriber triggers.
    pub fn subscribe(&self) -> Subscription {
        self.subscribers.send_modify(|n| *n += 1);

        let mut rx = self.slot.subscribe();
        // A fresh receiver considers the current value seen; undo that so
        // the first recv() replays it.
        rx.mark_changed();

        Subscription {
            rx,
            _guard: SubscriberGuard {
                subscribers: self.subscribers.clone(),
            },
        }
    }

    #[cfg(test)]
    fn latest(&self) -> Option<Snapshot> {
        self.slot.borrow().clone()
    }
}

impl Subscription {
    /// Wait for the next snapshot.
    ///
    /// Returns `None` only once the hub and all other handles are gone and
    /// no further emission can ever arrive.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        loop {
            self.rx.changed().await.ok()?;
            let current = self.rx.borrow_and_update().clone();
            if let Some(snap) = current {
                return Some(snap);
            }
        }
    }
}

/// The single upstream worker: subscribes to the store's revision signal
/// once and fans emissions out through the replay slot.
async fn upstream(
    store: Arc<dyn PokemonStore>,
    slot: watch::Sender<Option<Snapshot>>,
    mut subscribers: watch::Receiver<usize>,
    grace: Duration,
) {
    let mut revision = store.revision();

    loop {
        // Parked: nothing to do until somebody subscribes. An error means
        // the hub and every subscription guard are gone.
        while *subscribers.borrow_and_update() == 0 {
            if subscribers.changed().await.is_err() {
                return;
            }
        }

        // Prime: the slot may be stale (or empty) after parking.
        publish(&store, &slot).await;

        let mut idle_deadline: Option<Instant> = None;
        loop {
            tokio::select! {
                res = revision.changed() => {
                    if res.is_err() {
                        return;
                    }
                    publish(&store, &slot).await;
                }
                res = subscribers.changed() => {
                    if res.is_err() {
                        return;
                    }
                    let n = *subscribers.borrow_and_update();
                    idle_deadline = if n == 0 {
                        Some(Instant::now() + grace)
                    } else {
                        None
                    };
                }
                _ = sleep_until(idle_deadline.unwrap_or_else(Instant::now)),
                    if idle_deadline.is_some() =>
                {
                    break;
                }
            }
        }
    }
}

async fn publish(store: &Arc<dyn PokemonStore>, slot: &watch::Sender<Option<Snapshot>>) {
    match store.snapshot().await {
        Ok(snap) => {
            slot.send_replace(Some(snap));
        }
        Err(e) => {
            // Observers keep the previous emission; the stream never
            // carries an error value.
            warn!(error = %e, "snapshot read failed");
        }
    }
}
