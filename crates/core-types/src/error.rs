use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The error taxonomy shared by every crate in the workspace.
///
/// Each crate keeps its own `thiserror` enum with a human-readable message and
/// exposes a `kind()` accessor that maps onto one of these variants, so callers
/// can branch on the category without matching on crate-specific errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidAmount,
    InvalidPrice,
    InvalidWindow,
    LimitExceeded,
    InsufficientFunds,
    InsufficientHoldings,
    InsufficientSupply,
    TradingSuspended,
    NoActiveWindow,
    UnverifiedDestination,
    InvalidTransition,
    NotFound,
    Duplicate,
    MarketClosed,
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidInput(..) => ErrorKind::InvalidAmount,
        }
    }
}
