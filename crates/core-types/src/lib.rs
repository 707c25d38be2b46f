//! # Crease Core Types
//!
//! Layer 0 of the workspace: identifiers, shared enums, the performance
//! statistics delivered by match events, the error taxonomy and the `Clock`
//! abstraction. Every other crate depends on this one and nothing here depends
//! on them.

pub mod clock;
pub mod enums;
pub mod error;
pub mod ids;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use clock::{Clock, ManualClock, SystemClock};
pub use enums::{
    Direction, IpoStatus, PaymentMethod, Timeframe, TradeSide, TradingStatus, TransactionKind,
    TransactionStatus, WithdrawalStatus,
};
pub use error::{CoreError, ErrorKind};
pub use ids::{AccountId, EventId, InstrumentId};
pub use structs::{MatchEvent, PerformanceStats};
