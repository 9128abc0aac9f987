//! In-order fan-out of build events.

use tokio::sync::{broadcast, watch};
use tracing::{debug, trace};

use devutils_models::BuildEvent;

/// Default number of buffered events per subscriber.
const DEFAULT_CAPACITY: usize = 256;

/// Broadcasts host build events to every subscriber in delivery order.
///
/// A session subscribes before it triggers a build, so the matching done
/// event cannot be missed.
#[derive(Debug, Clone)]
pub struct BuildEventHub {
    tx: broadcast::Sender<BuildEvent>,
    abandoned: watch::Sender<u64>,
}

impl Default for BuildEventHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BuildEventHub {
    /// Creates a hub buffering `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        let (abandoned, _) = watch::channel(0);
        Self { tx, abandoned }
    }

    /// Subscribes to all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<BuildEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event. Returns how many subscribers received it.
    pub fn publish(&self, event: BuildEvent) -> usize {
        let receivers = self.tx.send(event).unwrap_or(0);
        trace!(receivers, "build event published");
        receivers
    }

    /// Signals that the host tore down its build context.
    ///
    /// Sessions waiting for a project build give up instead of waiting for
    /// their timeout. Returns the number of abandonments so far.
    pub fn abandon_builds(&self) -> u64 {
        self.abandoned.send_modify(|count| *count += 1);
        let count = *self.abandoned.borrow();
        debug!(count, "builds abandoned");
        count
    }

    /// Watches abandonment signals.
    pub fn watch_abandoned(&self) -> watch::Receiver<u64> {
        self.abandoned.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
