use crate::error::EventsError;
use crate::messages::MarketEvent;
use tokio::sync::broadcast;

/// Where the core writes notifications. Delivery is fire-and-forget.
///
/// Implementations must not block and must not propagate delivery failures
/// back into the operation that produced the event.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: MarketEvent) -> Result<(), EventsError>;
}

/// Fans notifications out over a `tokio::sync::broadcast` channel.
///
/// Slow subscribers lag and lose messages, which is acceptable: notification
/// loss never affects ledger correctness.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<MarketEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.tx.subscribe()
    }
}

impl NotificationSink for BroadcastSink {
    fn publish(&self, event: MarketEvent) -> Result<(), EventsError> {
        self.tx
            .send(event)
            .map(|_| ())
            .map_err(|_| EventsError::NoSubscribers)
    }
}

/// Discards everything. Useful when no push transport is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish(&self, _event: MarketEvent) -> Result<(), EventsError> {
        Ok(())
    }
}

/// Publishes `event`, logging (never returning) a delivery failure.
pub fn publish_or_log(sink: &dyn NotificationSink, event: MarketEvent) {
    if let Err(e) = sink.publish(event) {
        tracing::debug!(error = %e, "Notification dropped.");
    }
}
