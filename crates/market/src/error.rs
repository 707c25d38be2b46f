use core_types::{CoreError, ErrorKind, EventId, InstrumentId, TradingStatus};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),

    #[error("Invalid IPO window: {0}")]
    InvalidWindow(String),

    #[error("No active IPO window for event {event_id} on {instrument_id}")]
    NoActiveWindow {
        instrument_id: InstrumentId,
        event_id: EventId,
    },

    #[error("IPO window not found for event {0}")]
    WindowNotFound(EventId),

    #[error("Insufficient supply. Requested: {requested}, Available: {available}")]
    InsufficientSupply { requested: u64, available: u64 },

    #[error("Trading in {instrument_id} is not allowed while {status:?}")]
    TradingSuspended {
        instrument_id: InstrumentId,
        status: TradingStatus,
    },

    #[error("Illegal transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid performance statistics: {0}")]
    InvalidStats(#[from] CoreError),

    #[error("Quantity must be positive")]
    ZeroQuantity,

    #[error("Invalid supply: {0}")]
    InvalidSupply(String),
}

impl MarketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::InvalidPrice(_) => ErrorKind::InvalidPrice,
            MarketError::InvalidWindow(_) => ErrorKind::InvalidWindow,
            MarketError::NoActiveWindow { .. } => ErrorKind::NoActiveWindow,
            MarketError::WindowNotFound(_) => ErrorKind::NotFound,
            MarketError::InsufficientSupply { .. } => ErrorKind::InsufficientSupply,
            MarketError::TradingSuspended { .. } => ErrorKind::TradingSuspended,
            MarketError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            MarketError::InvalidStats(e) => e.kind(),
            MarketError::ZeroQuantity | MarketError::InvalidSupply(_) => ErrorKind::InvalidAmount,
        }
    }
}
