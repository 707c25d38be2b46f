use crate::registry::Registry;
use core_types::{AccountId, EventId, InstrumentId};
use ledger::AccountLedger;
use market::Instrument;
use portfolio::Portfolio;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// One broken invariant found by the auditor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Discrepancy {
    LedgerImbalance {
        account_id: AccountId,
        recorded: Decimal,
        computed: Decimal,
    },
    NegativeBalance {
        account_id: AccountId,
        balance: Decimal,
    },
    PriceNotInHistory {
        instrument_id: InstrumentId,
        current: Decimal,
        last_recorded: Option<Decimal>,
    },
    HistoryOutOfOrder {
        instrument_id: InstrumentId,
    },
    MarketCapMismatch {
        instrument_id: InstrumentId,
        recorded: Decimal,
        expected: Decimal,
    },
    SupplyExceeded {
        instrument_id: InstrumentId,
        circulating: u64,
        total: u64,
    },
    IpoOversold {
        instrument_id: InstrumentId,
        event_id: EventId,
        sold: u64,
        total: u64,
    },
    SharesNotConserved {
        instrument_id: InstrumentId,
        held: u64,
        circulating: u64,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub accounts_checked: usize,
    pub instruments_checked: usize,
    pub discrepancies: Vec<Discrepancy>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// The "source of truth auditor" for the engine's in-memory state.
///
/// It re-derives every invariant from first principles: balances from
/// journals, market caps from prices and supply, circulating supply from the
/// holdings of every account. It runs on demand and spawns nothing.
pub struct StateAuditor<'a> {
    ledgers: &'a Registry<AccountId, AccountLedger>,
    portfolios: &'a Registry<AccountId, Portfolio>,
    instruments: &'a Registry<InstrumentId, Instrument>,
}

impl<'a> StateAuditor<'a> {
    pub fn new(
        ledgers: &'a Registry<AccountId, AccountLedger>,
        portfolios: &'a Registry<AccountId, Portfolio>,
        instruments: &'a Registry<InstrumentId, Instrument>,
    ) -> Self {
        Self {
            ledgers,
            portfolios,
            instruments,
        }
    }

    pub async fn run(&self) -> AuditReport {
        tracing::debug!("Running state audit...");
        let mut report = AuditReport::default();

        // 1. Hold every instrument lock, in key order. Trades take their
        //    instrument lock first, so none is in flight while we read.
        let instrument_cells = self.instruments.entries().await;
        let mut instruments = Vec::with_capacity(instrument_cells.len());
        for (_, cell) in &instrument_cells {
            instruments.push(cell.lock().await);
        }

        // 2. Ledgers: balance against journal.
        for (account_id, cell) in self.ledgers.entries().await {
            let ledger = cell.lock().await;
            let reconciliation = ledger.reconcile();
            if !reconciliation.is_balanced() {
                report.discrepancies.push(Discrepancy::LedgerImbalance {
                    account_id,
                    recorded: reconciliation.recorded,
                    computed: reconciliation.computed,
                });
            }
            if ledger.balance().is_sign_negative() {
                report.discrepancies.push(Discrepancy::NegativeBalance {
                    account_id,
                    balance: ledger.balance(),
                });
            }
            report.accounts_checked += 1;
        }

        // 3. Holdings, summed per instrument.
        let mut held: HashMap<InstrumentId, u64> = HashMap::new();
        for (_, cell) in self.portfolios.entries().await {
            let portfolio = cell.lock().await;
            for holding in portfolio.holdings() {
                *held.entry(holding.instrument_id.clone()).or_default() += holding.quantity;
            }
        }

        // 4. Instruments.
        for instrument in &instruments {
            self.check_instrument(instrument, &held, &mut report.discrepancies);
            report.instruments_checked += 1;
        }

        if report.is_clean() {
            tracing::info!(
                accounts = report.accounts_checked,
                instruments = report.instruments_checked,
                "State audit complete. No discrepancies."
            );
        } else {
            for discrepancy in &report.discrepancies {
                tracing::error!(?discrepancy, "[AUDIT] Invariant violated.");
            }
        }
        report
    }

    fn check_instrument(
        &self,
        instrument: &Instrument,
        held: &HashMap<InstrumentId, u64>,
        out: &mut Vec<Discrepancy>,
    ) {
        let id = instrument.id();
        let last_recorded = instrument.history().last().map(|p| p.price);
        if last_recorded != Some(instrument.current_price()) {
            out.push(Discrepancy::PriceNotInHistory {
                instrument_id: id.clone(),
                current: instrument.current_price(),
                last_recorded,
            });
        }
        if !instrument.history().is_strictly_ordered() {
            out.push(Discrepancy::HistoryOutOfOrder {
                instrument_id: id.clone(),
            });
        }

        let expected = instrument.current_price() * Decimal::from(instrument.circulating_supply());
        if instrument.market_cap() != expected {
            out.push(Discrepancy::MarketCapMismatch {
                instrument_id: id.clone(),
                recorded: instrument.market_cap(),
                expected,
            });
        }
        if instrument.circulating_supply() > instrument.total_supply() {
            out.push(Discrepancy::SupplyExceeded {
                instrument_id: id.clone(),
                circulating: instrument.circulating_supply(),
                total: instrument.total_supply(),
            });
        }

        for window in instrument.ipo_windows() {
            if window.sold_units > window.total_units
                || window.sold_units + window.available_units != window.total_units
            {
                out.push(Discrepancy::IpoOversold {
                    instrument_id: id.clone(),
                    event_id: window.event_id.clone(),
                    sold: window.sold_units,
                    total: window.total_units,
                });
            }
        }

        let held_units = held.get(id).copied().unwrap_or(0);
        if held_units != instrument.circulating_supply() {
            out.push(Discrepancy::SharesNotConserved {
                instrument_id: id.clone(),
                held: held_units,
                circulating: instrument.circulating_supply(),
            });
        }
    }
}
