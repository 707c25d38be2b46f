use crate::error::EventsError;
use crate::messages::MarketEvent;
use tokio::sync::broadcast;

/// A long-running task that drains a notification subscription and hands each
/// event to `deliver`.
///
/// Delivery failures are logged and never retried. Returns the number of
/// events delivered once the channel closes.
pub async fn run_relay<F>(mut event_rx: broadcast::Receiver<MarketEvent>, mut deliver: F) -> u64
where
    F: FnMut(&MarketEvent) -> Result<(), EventsError>,
{
    tracing::info!("Notification relay started.");
    let mut delivered = 0u64;

    loop {
        match event_rx.recv().await {
            Ok(event) => match deliver(&event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::error!(error = ?e, instrument = %event.instrument_id(), "Failed to deliver notification.");
                }
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Notification relay lagged, skipped {} messages.", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!(delivered, "Notification channel closed. Relay shutting down.");
                break;
            }
        }
    }

    delivered
}

/// Renders an event as a single JSON line, the wire form for push transports.
pub fn to_json_line(event: &MarketEvent) -> Result<String, EventsError> {
    Ok(serde_json::to_string(event)?)
}
