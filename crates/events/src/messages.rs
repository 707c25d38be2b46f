use chrono::{DateTime, Utc};
use core_types::{AccountId, InstrumentId, TradeSide, TradingStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Published whenever an instrument's price is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChanged {
    pub instrument_id: InstrumentId,
    pub previous_price: Decimal,
    pub new_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Published once a buy, sell or IPO subscription has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCompleted {
    pub account_id: AccountId,
    pub transaction_reference: String,
    pub instrument_id: InstrumentId,
    pub side: TradeSide,
    pub quantity: u64,
    pub unit_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingStatusChanged {
    pub instrument_id: InstrumentId,
    pub previous: TradingStatus,
    pub current: TradingStatus,
    pub timestamp: DateTime<Utc>,
}

/// The top-level notification enum. Everything the core publishes is one of these.
///
/// Serialized adjacently tagged, e.g.
/// `{ "type": "PriceChanged", "payload": { "instrument_id": "...", ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum MarketEvent {
    PriceChanged(PriceChanged),
    TradeCompleted(TradeCompleted),
    TradingStatusChanged(TradingStatusChanged),
}

impl MarketEvent {
    pub fn instrument_id(&self) -> &InstrumentId {
        match self {
            MarketEvent::PriceChanged(e) => &e.instrument_id,
            MarketEvent::TradeCompleted(e) => &e.instrument_id,
            MarketEvent::TradingStatusChanged(e) => &e.instrument_id,
        }
    }
}
