//! # Crease Portfolio
//!
//! Per-account share holdings with average-cost accounting. Buys recompute a
//! weighted average cost; sells reduce quantity, leave the average untouched and
//! report realized P&L. Positions that reach zero are removed.
//!
//! Cash is not tracked here; it lives in the `ledger` crate.

// Declare the modules that make up this crate.
pub mod error;
pub mod portfolio;

// Re-export the core types to provide a clean public API.
pub use error::PortfolioError;
pub use portfolio::{Holding, HoldingView, Portfolio, PositionValuation, SellOutcome, Valuation};
