use crate::TradingEngine;
use crate::error::EngineError;
use crate::receipt::{TradeReceipt, TradeStage};
use core_types::{AccountId, EventId, InstrumentId, TradeSide, TransactionStatus};
use events::{MarketEvent, TradeCompleted, publish_or_log};
use ledger::{LedgerError, TradeDetails, TransactionDetails};
use market::MarketError;
use portfolio::PortfolioError;
use risk::TradeRequest;
use rust_decimal::Decimal;

impl TradingEngine {
    /// Buys `quantity` units at the current price. All or nothing.
    pub async fn buy(
        &self,
        account_id: AccountId,
        instrument_id: &InstrumentId,
        quantity: u64,
    ) -> Result<TradeReceipt, EngineError> {
        let mut stage = TradeStage::Requested;
        let result = self.execute_buy(account_id, instrument_id, quantity, &mut stage).await;
        self.finish(result, TradeSide::Buy, account_id, instrument_id, quantity, stage)
    }

    /// Sells `quantity` units at the current price. All or nothing.
    pub async fn sell(
        &self,
        account_id: AccountId,
        instrument_id: &InstrumentId,
        quantity: u64,
    ) -> Result<TradeReceipt, EngineError> {
        let mut stage = TradeStage::Requested;
        let result = self.execute_sell(account_id, instrument_id, quantity, &mut stage).await;
        self.finish(result, TradeSide::Sell, account_id, instrument_id, quantity, stage)
    }

    /// Subscribes to the IPO window of `event_id` at its base price.
    pub async fn participate_in_ipo(
        &self,
        account_id: AccountId,
        instrument_id: &InstrumentId,
        event_id: &EventId,
        quantity: u64,
    ) -> Result<TradeReceipt, EngineError> {
        let mut stage = TradeStage::Requested;
        let result = self
            .execute_ipo(account_id, instrument_id, event_id, quantity, &mut stage)
            .await;
        self.finish(
            result,
            TradeSide::IpoSubscription,
            account_id,
            instrument_id,
            quantity,
            stage,
        )
    }

    async fn execute_buy(
        &self,
        account_id: AccountId,
        instrument_id: &InstrumentId,
        quantity: u64,
        stage: &mut TradeStage,
    ) -> Result<TradeReceipt, EngineError> {
        let now = self.now();
        let instrument_cell = self.instrument(instrument_id).await?;
        let ledger_cell = self.ledger(account_id).await?;
        let portfolio_cell = self.portfolio(account_id).await?;

        // --- 1. Validation, under the instrument and ledger locks ---
        let mut instrument = instrument_cell.lock().await;
        self.guard.check(&TradeRequest {
            instrument_id,
            side: TradeSide::Buy,
            quantity,
            daily_volume: instrument.volume().daily,
            at: now,
        })?;
        instrument.ensure_tradable()?;
        let price = tradable_price(instrument.current_price())?;
        let total = price * Decimal::from(quantity);

        let mut ledger = ledger_cell.lock().await;
        if ledger.balance() < total {
            return Err(LedgerError::InsufficientFunds {
                required: total,
                available: ledger.balance(),
            }
            .into());
        }
        let headroom = instrument.total_supply() - instrument.circulating_supply();
        if quantity > headroom {
            return Err(MarketError::InsufficientSupply {
                requested: quantity,
                available: headroom,
            }
            .into());
        }
        let mut portfolio = portfolio_cell.lock().await;
        *stage = TradeStage::Validated;

        // --- 2. Apply, compensating on failure ---
        instrument.issue(quantity)?;
        let previous = portfolio.holding(instrument_id).cloned();
        let holding_after = match portfolio.apply_buy(instrument_id, quantity, price, now) {
            Ok(view) => view,
            Err(e) => {
                compensate("redeem issued units", instrument.redeem(quantity));
                return Err(e.into());
            }
        };
        let details = TransactionDetails::InstrumentBuy(TradeDetails {
            instrument_id: instrument_id.clone(),
            quantity,
            unit_price: price,
        });
        let txn = match ledger.add_transaction(details, total, TransactionStatus::Completed, now) {
            Ok(txn) => txn,
            Err(e) => {
                portfolio.restore(instrument_id, previous);
                compensate("redeem issued units", instrument.redeem(quantity));
                return Err(e.into());
            }
        };
        instrument.record_volume(quantity);
        *stage = TradeStage::Applied;

        Ok(TradeReceipt {
            reference: txn.reference,
            transaction_id: txn.id,
            account_id,
            instrument_id: instrument_id.clone(),
            side: TradeSide::Buy,
            quantity,
            unit_price: price,
            total,
            balance_after: ledger.balance(),
            holding_after,
            realized_pnl: None,
            executed_at: now,
            stage: TradeStage::ReceiptIssued,
        })
    }

    async fn execute_sell(
        &self,
        account_id: AccountId,
        instrument_id: &InstrumentId,
        quantity: u64,
        stage: &mut TradeStage,
    ) -> Result<TradeReceipt, EngineError> {
        let now = self.now();
        let instrument_cell = self.instrument(instrument_id).await?;
        let ledger_cell = self.ledger(account_id).await?;
        let portfolio_cell = self.portfolio(account_id).await?;

        // --- 1. Validation ---
        let mut instrument = instrument_cell.lock().await;
        self.guard.check(&TradeRequest {
            instrument_id,
            side: TradeSide::Sell,
            quantity,
            daily_volume: instrument.volume().daily,
            at: now,
        })?;
        instrument.ensure_tradable()?;
        let price = tradable_price(instrument.current_price())?;
        let proceeds = price * Decimal::from(quantity);

        let mut ledger = ledger_cell.lock().await;
        let mut portfolio = portfolio_cell.lock().await;
        let held = portfolio.holding_of(instrument_id).quantity;
        if quantity > held {
            return Err(PortfolioError::InsufficientHoldings {
                instrument_id: instrument_id.clone(),
                requested: quantity,
                held,
            }
            .into());
        }
        *stage = TradeStage::Validated;

        // --- 2. Apply, compensating on failure ---
        let previous = portfolio.holding(instrument_id).cloned();
        let outcome = portfolio.apply_sell(instrument_id, quantity, price, now)?;
        if let Err(e) = instrument.redeem(quantity) {
            portfolio.restore(instrument_id, previous);
            return Err(e.into());
        }
        let details = TransactionDetails::InstrumentSell(TradeDetails {
            instrument_id: instrument_id.clone(),
            quantity,
            unit_price: price,
        });
        let txn = match ledger.add_transaction(details, proceeds, TransactionStatus::Completed, now) {
            Ok(txn) => txn,
            Err(e) => {
                compensate("re-issue redeemed units", instrument.issue(quantity));
                portfolio.restore(instrument_id, previous);
                return Err(e.into());
            }
        };
        instrument.record_volume(quantity);
        *stage = TradeStage::Applied;

        Ok(TradeReceipt {
            reference: txn.reference,
            transaction_id: txn.id,
            account_id,
            instrument_id: instrument_id.clone(),
            side: TradeSide::Sell,
            quantity,
            unit_price: price,
            total: proceeds,
            balance_after: ledger.balance(),
            holding_after: outcome.remaining,
            realized_pnl: Some(outcome.realized_pnl),
            executed_at: now,
            stage: TradeStage::ReceiptIssued,
        })
    }

    async fn execute_ipo(
        &self,
        account_id: AccountId,
        instrument_id: &InstrumentId,
        event_id: &EventId,
        quantity: u64,
        stage: &mut TradeStage,
    ) -> Result<TradeReceipt, EngineError> {
        let now = self.now();
        let instrument_cell = self.instrument(instrument_id).await?;
        let ledger_cell = self.ledger(account_id).await?;
        let portfolio_cell = self.portfolio(account_id).await?;

        let mut instrument = instrument_cell.lock().await;
        let mut ledger = ledger_cell.lock().await;
        let mut portfolio = portfolio_cell.lock().await;

        // Allocation is both the validation and the first apply step: the
        // window, supply and status checks all happen inside it.
        let base_price = instrument.allocate_ipo(event_id, quantity, now)?;
        *stage = TradeStage::Validated;
        let total = base_price * Decimal::from(quantity);

        let details = TransactionDetails::IpoInvestment(TradeDetails {
            instrument_id: instrument_id.clone(),
            quantity,
            unit_price: base_price,
        });
        let txn = match ledger.add_transaction(details, total, TransactionStatus::Completed, now) {
            Ok(txn) => txn,
            Err(e) => {
                compensate("release IPO allocation", instrument.release_ipo(event_id, quantity));
                return Err(e.into());
            }
        };
        let holding_after = match portfolio.apply_buy(instrument_id, quantity, base_price, now) {
            Ok(view) => view,
            Err(e) => {
                let refund = TransactionDetails::Refund {
                    reason: format!("IPO subscription {} could not be applied", txn.reference),
                };
                compensate(
                    "refund IPO payment",
                    ledger.add_transaction(refund, total, TransactionStatus::Completed, now),
                );
                compensate("release IPO allocation", instrument.release_ipo(event_id, quantity));
                return Err(e.into());
            }
        };
        *stage = TradeStage::Applied;

        Ok(TradeReceipt {
            reference: txn.reference,
            transaction_id: txn.id,
            account_id,
            instrument_id: instrument_id.clone(),
            side: TradeSide::IpoSubscription,
            quantity,
            unit_price: base_price,
            total,
            balance_after: ledger.balance(),
            holding_after,
            realized_pnl: None,
            executed_at: now,
            stage: TradeStage::ReceiptIssued,
        })
    }

    /// Logs the outcome and, once all locks are released, publishes the
    /// trade notification.
    fn finish(
        &self,
        result: Result<TradeReceipt, EngineError>,
        side: TradeSide,
        account_id: AccountId,
        instrument_id: &InstrumentId,
        quantity: u64,
        stage: TradeStage,
    ) -> Result<TradeReceipt, EngineError> {
        match &result {
            Ok(receipt) => {
                tracing::info!(
                    account = %account_id,
                    instrument = %instrument_id,
                    ?side,
                    quantity,
                    price = %receipt.unit_price,
                    reference = %receipt.reference,
                    "Trade executed."
                );
                publish_or_log(
                    self.notifier.as_ref(),
                    MarketEvent::TradeCompleted(TradeCompleted {
                        account_id,
                        transaction_reference: receipt.reference.clone(),
                        instrument_id: instrument_id.clone(),
                        side,
                        quantity,
                        unit_price: receipt.unit_price,
                        timestamp: receipt.executed_at,
                    }),
                );
            }
            Err(e) => {
                tracing::warn!(
                    account = %account_id,
                    instrument = %instrument_id,
                    ?side,
                    quantity,
                    stage = ?TradeStage::terminal(&result),
                    reached = ?stage,
                    error = %e,
                    "Trade rejected."
                );
            }
        }
        result
    }
}

fn tradable_price(price: Decimal) -> Result<Decimal, MarketError> {
    if price <= Decimal::ZERO {
        return Err(MarketError::InvalidPrice(price));
    }
    Ok(price)
}

/// Compensation steps undo work that was just done under the same locks, so
/// they cannot fail unless an invariant is already broken. Log loudly if so.
fn compensate<T, E: std::fmt::Display>(step: &str, result: Result<T, E>) {
    if let Err(e) = result {
        tracing::error!(step, error = %e, "CRITICAL: compensation step failed.");
    }
}

