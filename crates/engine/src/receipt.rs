use chrono::{DateTime, Utc};
use core_types::{AccountId, InstrumentId, TradeSide};
use portfolio::HoldingView;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How far a trade request got. A rejected request never leaves partial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStage {
    Requested,
    Validated,
    Applied,
    ReceiptIssued,
    Rejected,
}

impl TradeStage {
    /// The stage a finished request ends in.
    pub fn terminal<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => TradeStage::ReceiptIssued,
            Err(_) => TradeStage::Rejected,
        }
    }
}

/// Returned for every executed buy, sell or IPO subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub reference: String,
    pub transaction_id: Uuid,
    pub account_id: AccountId,
    pub instrument_id: InstrumentId,
    pub side: TradeSide,
    pub quantity: u64,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub balance_after: Decimal,
    pub holding_after: HoldingView,
    /// Only set for sells.
    pub realized_pnl: Option<Decimal>,
    pub executed_at: DateTime<Utc>,
    pub stage: TradeStage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_requests_end_issued_or_rejected() {
        assert_eq!(TradeStage::terminal::<(), ()>(&Ok(())), TradeStage::ReceiptIssued);
        assert_eq!(TradeStage::terminal::<(), ()>(&Err(())), TradeStage::Rejected);
        assert_eq!(
            serde_json::to_string(&TradeStage::Rejected).unwrap(),
            "\"REJECTED\""
        );
    }
}
