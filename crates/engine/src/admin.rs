use crate::TradingEngine;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use core_types::{
    AccountId, EventId, InstrumentId, MatchEvent, PerformanceStats, Timeframe, TradingStatus,
    TransactionStatus,
};
use events::{MarketEvent, PriceChanged, TradingStatusChanged, publish_or_log};
use ledger::{Transaction, WithdrawalDecision, WithdrawalRequest};
use market::{ImpactRecord, Instrument, InstrumentSnapshot, IpoWindow, NewInstrument};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terms of a new IPO window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpoTerms {
    pub event_id: EventId,
    pub base_price: Decimal,
    pub max_price: Decimal,
    pub units: u64,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

/// Outcome of applying one event's results across many instruments.
#[derive(Debug, Default)]
pub struct MatchResults {
    pub applied: Vec<ImpactRecord>,
    pub failed: Vec<(InstrumentId, EngineError)>,
}

impl TradingEngine {
    // --- Match events ---

    /// Applies one performer's statistics to their instrument and publishes
    /// the price change. Idempotent per event id.
    pub async fn apply_match_event(&self, event: &MatchEvent) -> Result<ImpactRecord, EngineError> {
        let cell = self.instrument(&event.instrument_id).await?;
        let (record, change) = {
            let mut instrument = cell.lock().await;
            instrument.apply_performance_impact(&event.event_id, &event.stats, self.now())?
        };

        // A re-delivered event with the same impact does not move the price.
        if change.previous != change.current {
            publish_or_log(
                self.notifier.as_ref(),
                MarketEvent::PriceChanged(PriceChanged {
                    instrument_id: event.instrument_id.clone(),
                    previous_price: change.previous,
                    new_price: change.current,
                    timestamp: change.timestamp,
                }),
            );
        }
        Ok(record)
    }

    /// Applies a completed event's statistics for every listed performer.
    ///
    /// Instruments are processed one at a time; a failure on one does not stop
    /// the others.
    pub async fn apply_match_results<I>(&self, event_id: &EventId, results: I) -> MatchResults
    where
        I: IntoIterator<Item = (InstrumentId, PerformanceStats)>,
    {
        let mut outcome = MatchResults::default();
        for (instrument_id, stats) in results {
            let event = MatchEvent {
                event_id: event_id.clone(),
                instrument_id,
                stats,
            };
            match self.apply_match_event(&event).await {
                Ok(record) => outcome.applied.push(record),
                Err(e) => {
                    tracing::warn!(event = %event_id, instrument = %event.instrument_id, error = %e, "Skipping match result.");
                    outcome.failed.push((event.instrument_id, e));
                }
            }
        }
        tracing::info!(
            event = %event_id,
            applied = outcome.applied.len(),
            failed = outcome.failed.len(),
            "Match results processed."
        );
        outcome
    }

    // --- Instrument administration ---

    pub async fn list_instrument(
        &self,
        params: NewInstrument,
    ) -> Result<InstrumentSnapshot, EngineError> {
        let instrument = Instrument::list(params, self.now())?;
        let snapshot = instrument.snapshot();
        if !self
            .instruments
            .try_insert(snapshot.id.clone(), instrument)
            .await
        {
            return Err(EngineError::AlreadyExists(snapshot.id.to_string()));
        }
        tracing::info!(instrument = %snapshot.id, price = %snapshot.current_price, "Instrument listed.");
        Ok(snapshot)
    }

    /// Returns the previous status.
    pub async fn set_trading_status(
        &self,
        instrument_id: &InstrumentId,
        status: TradingStatus,
    ) -> Result<TradingStatus, EngineError> {
        let cell = self.instrument(instrument_id).await?;
        let previous = cell.lock().await.set_trading_status(status)?;
        publish_or_log(
            self.notifier.as_ref(),
            MarketEvent::TradingStatusChanged(TradingStatusChanged {
                instrument_id: instrument_id.clone(),
                previous,
                current: status,
                timestamp: self.now(),
            }),
        );
        Ok(previous)
    }

    /// Schedules an IPO window. Rejects windows that overlap another
    /// non-cancelled window of the same instrument.
    pub async fn open_ipo(
        &self,
        instrument_id: &InstrumentId,
        terms: IpoTerms,
    ) -> Result<IpoWindow, EngineError> {
        let cell = self.instrument(instrument_id).await?;
        let window = cell.lock().await.open_ipo(
            terms.event_id,
            terms.base_price,
            terms.max_price,
            terms.units,
            terms.opens_at,
            terms.closes_at,
        )?;
        Ok(window)
    }

    pub async fn cancel_ipo(
        &self,
        instrument_id: &InstrumentId,
        event_id: &EventId,
    ) -> Result<IpoWindow, EngineError> {
        let cell = self.instrument(instrument_id).await?;
        let window = cell.lock().await.cancel_ipo(event_id, self.now())?;
        tracing::info!(instrument = %instrument_id, event = %event_id, sold = window.sold_units, "IPO window cancelled.");
        Ok(window)
    }

    /// Zeroes one volume window on every instrument. Returns how many were reset.
    pub async fn reset_volume(&self, window: Timeframe) -> usize {
        let entries = self.instruments.entries().await;
        for (_, cell) in &entries {
            cell.lock().await.reset_volume(window);
        }
        tracing::info!(?window, instruments = entries.len(), "Volume counters reset.");
        entries.len()
    }

    // --- Ledger administration ---

    pub async fn settle_transaction(
        &self,
        account_id: AccountId,
        transaction_id: Uuid,
        status: TransactionStatus,
    ) -> Result<Transaction, EngineError> {
        let cell = self.ledger(account_id).await?;
        let txn = cell
            .lock()
            .await
            .settle_transaction(transaction_id, status, self.now())?;
        Ok(txn)
    }

    pub async fn process_withdrawal_request(
        &self,
        account_id: AccountId,
        request_id: Uuid,
        decision: WithdrawalDecision,
        remarks: Option<String>,
    ) -> Result<WithdrawalRequest, EngineError> {
        let cell = self.ledger(account_id).await?;
        let request = cell.lock().await.process_withdrawal_request(
            request_id,
            decision,
            remarks,
            self.now(),
        )?;
        Ok(request)
    }

    pub async fn verify_payout_destination(
        &self,
        account_id: AccountId,
        account_number: &str,
    ) -> Result<(), EngineError> {
        let cell = self.ledger(account_id).await?;
        cell.lock().await.verify_destination(account_number)?;
        tracing::info!(account = %account_id, "Payout destination verified.");
        Ok(())
    }
}
