//! # Crease Ledger
//!
//! The per-account cash ledger: a balance, an append-only transaction journal,
//! payout destinations and withdrawal requests.
//!
//! ## Invariants
//!
//! - The balance equals the signed sum of COMPLETED transactions and is never negative.
//! - Transaction status only moves forward, from PENDING to a terminal status.
//! - Every rejected operation leaves the ledger untouched.
//!
//! The ledger is a plain state machine with no locking of its own. The trading
//! engine serialises access to each account behind a `tokio::sync::Mutex`.

// Declare the modules that make up this crate.
pub mod error;
pub mod ledger;
pub mod transaction;
pub mod withdrawal;

// Re-export the core types to provide a clean public API.
pub use error::LedgerError;
pub use ledger::{AccountLedger, Reconciliation};
pub use transaction::{
    BankDetails, Page, PaymentDetails, TradeDetails, Transaction, TransactionDetails,
    TransactionFilter, generate_reference,
};
pub use withdrawal::{PayoutDestination, WithdrawalDecision, WithdrawalRequest};
