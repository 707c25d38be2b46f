//! # Crease Market
//!
//! Instruments and everything that moves their price or supply: the
//! performance-driven price-impact formula, append-only price history, trading
//! status, issuance and redemption, volume counters and IPO windows.
//!
//! Instruments are plain state machines. Serialising concurrent access is the
//! trading engine's job.

// Declare the modules that make up this crate.
pub mod error;
pub mod history;
pub mod impact;
pub mod instrument;
pub mod ipo;

// Re-export the core types to provide a clean public API.
pub use error::MarketError;
pub use history::{Performance, PriceHistory, PricePoint};
pub use impact::{ImpactBreakdown, MAX_IMPACT_PERCENT, compute_impact, price_after_impact, price_before_impact};
pub use instrument::{
    ImpactRecord, Instrument, InstrumentSnapshot, NewInstrument, PriceChange, VolumeCounters,
};
pub use ipo::IpoWindow;
