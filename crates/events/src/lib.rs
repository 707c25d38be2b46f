//! # Crease Events
//!
//! This crate defines the notifications the trading core publishes (price changes,
//! completed trades and trading status changes) and the sinks that carry them.
//!
//! As a Layer 0 crate, it depends only on `core-types`. Notification delivery is
//! fire-and-forget: nothing here can fail a ledger or trading operation.

// Declare the modules that make up this crate.
pub mod error;
pub mod messages;
pub mod relay;
pub mod sink;

// Re-export the core types to provide a clean public API.
pub use error::EventsError;
pub use messages::{MarketEvent, PriceChanged, TradeCompleted, TradingStatusChanged};
pub use relay::{run_relay, to_json_line};
pub use sink::{BroadcastSink, NotificationSink, NullSink, publish_or_log};
