//! # Crease Risk
//!
//! Pre-trade checks that run before the trading engine touches any state.
//! A guard only reads the request; it never mutates ledgers, portfolios or
//! instruments.

use chrono::{DateTime, Utc};
use core_types::{InstrumentId, TradeSide};

// Declare the modules that make up this crate.
pub mod error;
pub mod limits_guard;

// Re-export the core types to provide a clean public API.
pub use error::RiskError;
pub use limits_guard::LimitsGuard;

/// Everything a guard may look at when deciding on a trade.
#[derive(Debug, Clone, Copy)]
pub struct TradeRequest<'a> {
    pub instrument_id: &'a InstrumentId,
    pub side: TradeSide,
    pub quantity: u64,
    /// Units of this instrument already traded today, across all accounts.
    pub daily_volume: u64,
    pub at: DateTime<Utc>,
}

/// A pre-trade check. Implementations must be cheap and side-effect free.
pub trait TradeGuard: Send + Sync {
    fn check(&self, request: &TradeRequest<'_>) -> Result<(), RiskError>;
}
