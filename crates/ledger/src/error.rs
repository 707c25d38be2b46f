use core_types::{ErrorKind, TransactionStatus};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Daily {limit} limit exceeded. Used today: {used}, requested: {requested}, cap: {cap}")]
    LimitExceeded {
        limit: &'static str,
        used: Decimal,
        requested: Decimal,
        cap: Decimal,
    },

    #[error("Insufficient funds. Required: {required}, Available: {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("Payout destination {0} is not registered and verified")]
    UnverifiedDestination(String),

    #[error("Payout destination {0} is already registered")]
    DuplicateDestination(String),

    #[error("Payout destination not found: {0}")]
    DestinationNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    #[error("Withdrawal request not found: {0}")]
    WithdrawalRequestNotFound(Uuid),

    #[error("Illegal status transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("Withdrawal request {0} has already been processed")]
    RequestAlreadyProcessed(Uuid),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            LedgerError::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::UnverifiedDestination(_) => ErrorKind::UnverifiedDestination,
            LedgerError::DuplicateDestination(_) => ErrorKind::Duplicate,
            LedgerError::DestinationNotFound(_)
            | LedgerError::TransactionNotFound(_)
            | LedgerError::WithdrawalRequestNotFound(_) => ErrorKind::NotFound,
            LedgerError::InvalidTransition { .. } | LedgerError::RequestAlreadyProcessed(_) => {
                ErrorKind::InvalidTransition
            }
        }
    }
}
