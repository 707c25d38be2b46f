use crate::error::PortfolioError;
use chrono::{DateTime, Utc};
use core_types::{AccountId, InstrumentId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stored position. Only positive quantities are ever stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub instrument_id: InstrumentId,
    pub quantity: u64,
    pub average_cost: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Read-only view of a position, zero when nothing is held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingView {
    pub instrument_id: InstrumentId,
    pub quantity: u64,
    pub average_cost: Decimal,
}

impl HoldingView {
    fn empty(instrument_id: &InstrumentId) -> Self {
        Self {
            instrument_id: instrument_id.clone(),
            quantity: 0,
            average_cost: Decimal::ZERO,
        }
    }
}

impl From<&Holding> for HoldingView {
    fn from(h: &Holding) -> Self {
        Self {
            instrument_id: h.instrument_id.clone(),
            quantity: h.quantity,
            average_cost: h.average_cost,
        }
    }
}

/// What a sell did to the position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellOutcome {
    pub remaining: HoldingView,
    /// `quantity × (sale price − average cost)`. Reported, never stored.
    pub realized_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionValuation {
    pub instrument_id: InstrumentId,
    pub quantity: u64,
    pub average_cost: Decimal,
    pub price: Decimal,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub positions: Vec<PositionValuation>,
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub unrealized_pnl: Decimal,
}

/// Manages the share holdings of one account.
/// Its sole responsibility is to reflect the holdings implied by applied trades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    account_id: AccountId,
    holdings: HashMap<InstrumentId, Holding>,
    version: u64,
}

impl Portfolio {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            holdings: HashMap::new(),
            version: 0,
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn holding(&self, instrument_id: &InstrumentId) -> Option<&Holding> {
        self.holdings.get(instrument_id)
    }

    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    pub fn holding_of(&self, instrument_id: &InstrumentId) -> HoldingView {
        self.holdings
            .get(instrument_id)
            .map(HoldingView::from)
            .unwrap_or_else(|| HoldingView::empty(instrument_id))
    }

    /// Adds units at `unit_price`, recomputing the weighted average cost.
    pub fn apply_buy(
        &mut self,
        instrument_id: &InstrumentId,
        quantity: u64,
        unit_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<HoldingView, PortfolioError> {
        if quantity == 0 {
            return Err(PortfolioError::ZeroQuantity);
        }

        let holding = self
            .holdings
            .entry(instrument_id.clone())
            .or_insert_with(|| Holding {
                instrument_id: instrument_id.clone(),
                quantity: 0,
                average_cost: Decimal::ZERO,
                updated_at: now,
            });

        let existing_value = holding.average_cost * Decimal::from(holding.quantity);
        let new_value = unit_price * Decimal::from(quantity);
        let total_quantity = holding.quantity + quantity;

        holding.average_cost = (existing_value + new_value) / Decimal::from(total_quantity);
        holding.quantity = total_quantity;
        holding.updated_at = now;

        let view = HoldingView::from(&*holding);
        self.version += 1;
        Ok(view)
    }

    /// Removes units. The average cost of what remains is unchanged.
    pub fn apply_sell(
        &mut self,
        instrument_id: &InstrumentId,
        quantity: u64,
        sale_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<SellOutcome, PortfolioError> {
        if quantity == 0 {
            return Err(PortfolioError::ZeroQuantity);
        }
        let held = self.holdings.get(instrument_id).map_or(0, |h| h.quantity);
        let Some(holding) = self.holdings.get_mut(instrument_id).filter(|_| quantity <= held) else {
            return Err(PortfolioError::InsufficientHoldings {
                instrument_id: instrument_id.clone(),
                requested: quantity,
                held,
            });
        };

        let realized_pnl = Decimal::from(quantity) * (sale_price - holding.average_cost);
        holding.quantity -= quantity;
        holding.updated_at = now;
        let remaining = HoldingView::from(&*holding);

        // Zero-quantity holdings are never stored.
        if remaining.quantity == 0 {
            self.holdings.remove(instrument_id);
        }
        self.version += 1;

        Ok(SellOutcome {
            remaining,
            realized_pnl,
        })
    }

    /// Puts a holding back to a previously captured state. Compensation only.
    pub fn restore(&mut self, instrument_id: &InstrumentId, previous: Option<Holding>) {
        match previous {
            Some(holding) if holding.quantity > 0 => {
                self.holdings.insert(instrument_id.clone(), holding);
            }
            _ => {
                self.holdings.remove(instrument_id);
            }
        }
        self.version += 1;
        tracing::warn!(account = %self.account_id, instrument = %instrument_id, "Holding restored by compensation.");
    }

    /// Values every holding at the given prices.
    pub fn valuation(
        &self,
        prices: &HashMap<InstrumentId, Decimal>,
    ) -> Result<Valuation, PortfolioError> {
        let mut positions = Vec::with_capacity(self.holdings.len());
        for holding in self.holdings.values() {
            let price = *prices
                .get(&holding.instrument_id)
                .ok_or_else(|| PortfolioError::MissingPrice(holding.instrument_id.clone()))?;
            let quantity = Decimal::from(holding.quantity);
            positions.push(PositionValuation {
                instrument_id: holding.instrument_id.clone(),
                quantity: holding.quantity,
                average_cost: holding.average_cost,
                price,
                market_value: price * quantity,
                unrealized_pnl: (price - holding.average_cost) * quantity,
            });
        }
        positions.sort_by(|a, b| a.instrument_id.cmp(&b.instrument_id));

        let market_value: Decimal = positions.iter().map(|p| p.market_value).sum();
        let cost_basis: Decimal = positions
            .iter()
            .map(|p| p.average_cost * Decimal::from(p.quantity))
            .sum();
        let unrealized_pnl: Decimal = positions.iter().map(|p| p.unrealized_pnl).sum();

        Ok(Valuation {
            positions,
            market_value,
            cost_basis,
            unrealized_pnl,
        })
    }
}
