use core_types::{ErrorKind, InstrumentId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("Quantity must be positive")]
    ZeroQuantity,

    #[error("Insufficient holdings of {instrument_id}. Requested: {requested}, Held: {held}")]
    InsufficientHoldings {
        instrument_id: InstrumentId,
        requested: u64,
        held: u64,
    },

    #[error("Missing market price for instrument: {0}")]
    MissingPrice(InstrumentId),
}

impl PortfolioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PortfolioError::ZeroQuantity => ErrorKind::InvalidAmount,
            PortfolioError::InsufficientHoldings { .. } => ErrorKind::InsufficientHoldings,
            PortfolioError::MissingPrice(_) => ErrorKind::NotFound,
        }
    }
}
