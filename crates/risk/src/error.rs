use chrono::{DateTime, Utc};
use core_types::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("Trading limits from configuration are invalid: {0}")]
    InvalidParameters(String),

    #[error("Quantity {quantity} is below the minimum of {minimum} per trade.")]
    BelowMinimumQuantity { quantity: u64, minimum: u64 },

    #[error("Quantity {quantity} exceeds the maximum of {maximum} per trade.")]
    AboveMaximumQuantity { quantity: u64, maximum: u64 },

    #[error("Daily volume cap of {cap} would be exceeded ({traded} already traded, {requested} requested).")]
    DailyVolumeExceeded { traded: u64, requested: u64, cap: u64 },

    #[error("The market is closed at {0}.")]
    MarketClosed(DateTime<Utc>),
}

impl RiskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RiskError::InvalidParameters(_) => ErrorKind::Configuration,
            RiskError::BelowMinimumQuantity { .. } => ErrorKind::InvalidAmount,
            RiskError::AboveMaximumQuantity { .. } | RiskError::DailyVolumeExceeded { .. } => {
                ErrorKind::LimitExceeded
            }
            RiskError::MarketClosed(_) => ErrorKind::MarketClosed,
        }
    }
}
