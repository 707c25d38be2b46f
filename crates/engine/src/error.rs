use core_types::{AccountId, ErrorKind, InstrumentId};
use ledger::LedgerError;
use market::MarketError;
use portfolio::PortfolioError;
use risk::RiskError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Portfolio state error: {0}")]
    Portfolio(#[from] PortfolioError),

    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("Trade rejected by guard: {0}")]
    Risk(#[from] RiskError),

    #[error("Account '{0}' not found in the engine.")]
    AccountNotFound(AccountId),

    #[error("Instrument '{0}' not found in the engine.")]
    InstrumentNotFound(InstrumentId),

    #[error("'{0}' is already registered.")]
    AlreadyExists(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Configuration(_) => ErrorKind::Configuration,
            EngineError::Ledger(e) => e.kind(),
            EngineError::Portfolio(e) => e.kind(),
            EngineError::Market(e) => e.kind(),
            EngineError::Risk(e) => e.kind(),
            EngineError::AccountNotFound(_) | EngineError::InstrumentNotFound(_) => {
                ErrorKind::NotFound
            }
            EngineError::AlreadyExists(_) => ErrorKind::Duplicate,
        }
    }
}
