//! # Crease Engine
//!
//! The trading engine is the only component that touches more than one entity
//! at a time. It owns the registries of account ledgers, portfolios and
//! instruments, validates and executes trades across them, applies match
//! events and exposes the administrative and query surface.
//!
//! ## Concurrency
//!
//! Every entity sits behind its own `tokio::sync::Mutex`. Multi-entity
//! operations lock in a fixed order (instrument, then ledger, then portfolio)
//! and hold all of their locks from validation through apply, so a trade is
//! never observed half-done. Apply-phase failures are compensated before the
//! locks are released. The engine spawns no tasks of its own.

use crate::error::EngineError;
use crate::registry::Registry;
use chrono::{DateTime, Utc};
use configuration::Config;
use core_types::{
    AccountId, Clock, InstrumentId, Timeframe, TradingStatus, WithdrawalStatus,
};
use events::NotificationSink;
use ledger::{
    AccountLedger, BankDetails, Page, PaymentDetails, PayoutDestination, Transaction,
    TransactionFilter, WithdrawalRequest,
};
use market::{Instrument, InstrumentSnapshot, IpoWindow, PricePoint};
use portfolio::{HoldingView, Portfolio, Valuation};
use risk::{LimitsGuard, TradeGuard};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod admin;
pub mod auditor;
pub mod error;
pub mod receipt;
pub mod registry;
pub mod trading;

pub use admin::{IpoTerms, MatchResults};
pub use auditor::{AuditReport, Discrepancy, StateAuditor};
pub use receipt::{TradeReceipt, TradeStage};

/// Narrows `list_instruments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstrumentFilter {
    pub status: Option<TradingStatus>,
    /// Case-insensitive match against the instrument name.
    pub name_contains: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub account_id: AccountId,
    pub cash_balance: Decimal,
    pub valuation: Valuation,
    /// Cash plus the market value of all holdings.
    pub total_value: Decimal,
}

/// The central orchestrator of the exchange core.
pub struct TradingEngine {
    // --- Configuration ---
    config: Config,

    // --- Shared, Thread-Safe Components ---
    clock: Arc<dyn Clock>,
    guard: Arc<dyn TradeGuard>,
    notifier: Arc<dyn NotificationSink>,

    // --- Entity Registries ---
    ledgers: Registry<AccountId, AccountLedger>,
    portfolios: Registry<AccountId, Portfolio>,
    instruments: Registry<InstrumentId, Instrument>,
}

impl TradingEngine {
    /// Creates a new `TradingEngine` guarded by the configured trading limits.
    pub fn new(
        config: Config,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self, EngineError> {
        let guard = LimitsGuard::new(config.trading.clone(), config.market_hours.clone())
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        Ok(Self::with_guard(config, clock, notifier, Arc::new(guard)))
    }

    /// Creates an engine with a caller-supplied pre-trade guard.
    pub fn with_guard(
        config: Config,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
        guard: Arc<dyn TradeGuard>,
    ) -> Self {
        Self {
            config,
            clock,
            guard,
            notifier,
            ledgers: Registry::default(),
            portfolios: Registry::default(),
            instruments: Registry::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // --- Accounts ---

    /// Opens a new account with an empty ledger and portfolio.
    pub async fn open_account(&self) -> Result<AccountId, EngineError> {
        let account_id = AccountId::new();
        self.register_account(account_id).await?;
        Ok(account_id)
    }

    /// Opens an account under a known id.
    pub async fn register_account(&self, account_id: AccountId) -> Result<(), EngineError> {
        let ledger = AccountLedger::new(account_id, self.config.wallet.clone(), self.now());
        if !self.ledgers.try_insert(account_id, ledger).await {
            return Err(EngineError::AlreadyExists(account_id.to_string()));
        }
        if !self
            .portfolios
            .try_insert(account_id, Portfolio::new(account_id))
            .await
        {
            tracing::error!(account = %account_id, "Portfolio registered without a ledger.");
            return Err(EngineError::AlreadyExists(account_id.to_string()));
        }
        tracing::info!(account = %account_id, "Account opened.");
        Ok(())
    }

    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount: Decimal,
        payment: PaymentDetails,
    ) -> Result<Transaction, EngineError> {
        let cell = self.ledger(account_id).await?;
        let mut ledger = cell.lock().await;
        Ok(ledger.deposit(amount, payment, self.now())?)
    }

    pub async fn withdraw(
        &self,
        account_id: AccountId,
        amount: Decimal,
        destination_account_number: &str,
    ) -> Result<(WithdrawalRequest, Transaction), EngineError> {
        let cell = self.ledger(account_id).await?;
        let mut ledger = cell.lock().await;
        Ok(ledger.withdraw(amount, destination_account_number, self.now())?)
    }

    pub async fn register_payout_destination(
        &self,
        account_id: AccountId,
        bank: BankDetails,
    ) -> Result<PayoutDestination, EngineError> {
        let cell = self.ledger(account_id).await?;
        let mut ledger = cell.lock().await;
        Ok(ledger.register_destination(bank, self.now())?)
    }

    // --- Queries ---

    pub async fn balance(&self, account_id: AccountId) -> Result<Decimal, EngineError> {
        let cell = self.ledger(account_id).await?;
        let balance = cell.lock().await.balance();
        Ok(balance)
    }

    pub async fn balance_as_of(
        &self,
        account_id: AccountId,
        at: DateTime<Utc>,
    ) -> Result<Decimal, EngineError> {
        let cell = self.ledger(account_id).await?;
        let balance = cell.lock().await.balance_as_of(at);
        Ok(balance)
    }

    pub async fn transactions(
        &self,
        account_id: AccountId,
        filter: &TransactionFilter,
    ) -> Result<Page<Transaction>, EngineError> {
        let cell = self.ledger(account_id).await?;
        let page = cell.lock().await.transactions(filter);
        Ok(page)
    }

    pub async fn withdrawal_requests(
        &self,
        account_id: AccountId,
        status: Option<WithdrawalStatus>,
    ) -> Result<Vec<WithdrawalRequest>, EngineError> {
        let cell = self.ledger(account_id).await?;
        let requests = cell.lock().await.withdrawal_requests(status);
        Ok(requests)
    }

    pub async fn holding(
        &self,
        account_id: AccountId,
        instrument_id: &InstrumentId,
    ) -> Result<HoldingView, EngineError> {
        let cell = self.portfolio(account_id).await?;
        let view = cell.lock().await.holding_of(instrument_id);
        Ok(view)
    }

    /// Cash plus holdings valued at current prices.
    ///
    /// Each entity is read under its own lock in turn, so the summary is not an
    /// atomic snapshot across entities.
    pub async fn portfolio_summary(
        &self,
        account_id: AccountId,
    ) -> Result<PortfolioSummary, EngineError> {
        let cash_balance = self.balance(account_id).await?;
        let portfolio = self.portfolio(account_id).await?.lock().await.clone();

        let mut prices = HashMap::new();
        for holding in portfolio.holdings() {
            let instrument = self.instrument(&holding.instrument_id).await?;
            let price = instrument.lock().await.current_price();
            prices.insert(holding.instrument_id.clone(), price);
        }

        let valuation = portfolio.valuation(&prices)?;
        Ok(PortfolioSummary {
            account_id,
            cash_balance,
            total_value: cash_balance + valuation.market_value,
            valuation,
        })
    }

    pub async fn instrument_snapshot(
        &self,
        instrument_id: &InstrumentId,
    ) -> Result<InstrumentSnapshot, EngineError> {
        let cell = self.instrument(instrument_id).await?;
        let snapshot = cell.lock().await.snapshot();
        Ok(snapshot)
    }

    /// Snapshots of every listed instrument matching `filter`, ordered by id.
    pub async fn list_instruments(&self, filter: &InstrumentFilter) -> Vec<InstrumentSnapshot> {
        let needle = filter.name_contains.as_ref().map(|n| n.to_lowercase());
        let mut snapshots = Vec::new();
        for (_, cell) in self.instruments.entries().await {
            let snapshot = cell.lock().await.snapshot();
            let status_ok = filter.status.is_none_or(|s| snapshot.status == s);
            let name_ok = needle
                .as_ref()
                .is_none_or(|n| snapshot.name.to_lowercase().contains(n.as_str()));
            if status_ok && name_ok {
                snapshots.push(snapshot);
            }
        }
        snapshots
    }

    pub async fn price_history(
        &self,
        instrument_id: &InstrumentId,
        timeframe: Timeframe,
    ) -> Result<Vec<PricePoint>, EngineError> {
        let cell = self.instrument(instrument_id).await?;
        let history = cell.lock().await.price_history(timeframe, self.now());
        Ok(history)
    }

    /// The active IPO window, or else the next upcoming one.
    pub async fn ipo_details(
        &self,
        instrument_id: &InstrumentId,
    ) -> Result<Option<IpoWindow>, EngineError> {
        let cell = self.instrument(instrument_id).await?;
        let window = cell.lock().await.current_ipo(self.now());
        Ok(window)
    }

    /// Checks every invariant the engine maintains. See [`StateAuditor`].
    pub async fn audit(&self) -> AuditReport {
        StateAuditor::new(&self.ledgers, &self.portfolios, &self.instruments)
            .run()
            .await
    }

    // --- Lookups ---

    async fn ledger(&self, account_id: AccountId) -> Result<Arc<Mutex<AccountLedger>>, EngineError> {
        self.ledgers
            .get(&account_id)
            .await
            .ok_or(EngineError::AccountNotFound(account_id))
    }

    async fn portfolio(&self, account_id: AccountId) -> Result<Arc<Mutex<Portfolio>>, EngineError> {
        self.portfolios
            .get(&account_id)
            .await
            .ok_or(EngineError::AccountNotFound(account_id))
    }

    async fn instrument(
        &self,
        instrument_id: &InstrumentId,
    ) -> Result<Arc<Mutex<Instrument>>, EngineError> {
        self.instruments
            .get(instrument_id)
            .await
            .ok_or_else(|| EngineError::InstrumentNotFound(instrument_id.clone()))
    }
}

#[cfg(test)]
mod tests;
