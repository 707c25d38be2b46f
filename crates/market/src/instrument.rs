use crate::error::MarketError;
use crate::history::{Performance, PriceHistory, PricePoint};
use crate::impact::{
    ImpactBreakdown, PRICE_SCALE, compute_impact, price_after_impact, price_before_impact,
};
use crate::ipo::IpoWindow;
use chrono::{DateTime, Utc};
use core_types::{EventId, InstrumentId, IpoStatus, PerformanceStats, Timeframe, TradingStatus};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for listing a new instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInstrument {
    pub id: InstrumentId,
    pub name: String,
    pub performer_id: String,
    pub initial_price: Decimal,
    pub total_supply: u64,
}

/// Units traded over rolling windows. Reset by an external scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VolumeCounters {
    pub daily: u64,
    pub weekly: u64,
    pub monthly: u64,
}

/// One applied performance event, kept so re-delivery does not compound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRecord {
    pub event_id: EventId,
    pub stats: PerformanceStats,
    pub breakdown: ImpactBreakdown,
    /// Price this event's impact was applied to, with later events' impacts included.
    pub base_price: Decimal,
    pub resulting_price: Decimal,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChange {
    pub previous: Decimal,
    pub current: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    pub id: InstrumentId,
    pub name: String,
    pub performer_id: String,
    pub current_price: Decimal,
    pub previous_price: Decimal,
    pub status: TradingStatus,
    pub total_supply: u64,
    pub circulating_supply: u64,
    pub market_cap: Decimal,
    pub performance: Performance,
    pub volume: VolumeCounters,
    pub version: u64,
}

/// A tradable instrument backed by one performer.
///
/// Invariants held after every successful mutation:
/// `current_price` equals the last history entry, `market_cap` equals
/// `current_price × circulating_supply`, and `circulating_supply <= total_supply`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    id: InstrumentId,
    name: String,
    performer_id: String,
    current_price: Decimal,
    previous_price: Decimal,
    history: PriceHistory,
    status: TradingStatus,
    total_supply: u64,
    circulating_supply: u64,
    volume: VolumeCounters,
    market_cap: Decimal,
    performance: Performance,
    ipo_windows: Vec<IpoWindow>,
    impacts: HashMap<EventId, ImpactRecord>,
    version: u64,
}

impl Instrument {
    pub fn list(params: NewInstrument, now: DateTime<Utc>) -> Result<Self, MarketError> {
        if params.initial_price.is_sign_negative() {
            return Err(MarketError::InvalidPrice(params.initial_price));
        }
        if params.total_supply == 0 {
            return Err(MarketError::InvalidSupply(
                "total supply must be at least 1".to_string(),
            ));
        }

        let mut history = PriceHistory::default();
        history.push(params.initial_price, now);

        Ok(Self {
            id: params.id,
            name: params.name,
            performer_id: params.performer_id,
            current_price: params.initial_price,
            previous_price: params.initial_price,
            history,
            status: TradingStatus::Active,
            total_supply: params.total_supply,
            circulating_supply: 0,
            volume: VolumeCounters::default(),
            market_cap: Decimal::ZERO,
            performance: Performance::default(),
            ipo_windows: Vec::new(),
            impacts: HashMap::new(),
            version: 0,
        })
    }

    pub fn id(&self) -> &InstrumentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_price(&self) -> Decimal {
        self.current_price
    }

    pub fn previous_price(&self) -> Decimal {
        self.previous_price
    }

    pub fn status(&self) -> TradingStatus {
        self.status
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn circulating_supply(&self) -> u64 {
        self.circulating_supply
    }

    pub fn market_cap(&self) -> Decimal {
        self.market_cap
    }

    pub fn volume(&self) -> VolumeCounters {
        self.volume
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    pub fn ipo_windows(&self) -> &[IpoWindow] {
        &self.ipo_windows
    }

    pub fn impact_record(&self, event_id: &EventId) -> Option<&ImpactRecord> {
        self.impacts.get(event_id)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> InstrumentSnapshot {
        InstrumentSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            performer_id: self.performer_id.clone(),
            current_price: self.current_price,
            previous_price: self.previous_price,
            status: self.status,
            total_supply: self.total_supply,
            circulating_supply: self.circulating_supply,
            market_cap: self.market_cap,
            performance: self.performance,
            volume: self.volume,
            version: self.version,
        }
    }

    pub fn record_price(
        &mut self,
        new_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<PriceChange, MarketError> {
        if new_price.is_sign_negative() {
            return Err(MarketError::InvalidPrice(new_price));
        }

        self.previous_price = self.current_price;
        self.current_price = new_price;
        let point = self.history.push(new_price, now);
        self.performance = self.history.performance(new_price, point.timestamp);
        self.refresh_market_cap();
        self.version += 1;

        tracing::debug!(instrument = %self.id, previous = %self.previous_price, current = %new_price, "Price recorded.");
        Ok(PriceChange {
            previous: self.previous_price,
            current: new_price,
            timestamp: point.timestamp,
        })
    }

    /// Applies the price impact of a performance event.
    ///
    /// Idempotent per `event_id`: a repeated event backs its previously
    /// recorded impact out of the current price and applies the new one, so
    /// impacts of other events applied in between are kept. Re-delivering the
    /// same impact leaves the price untouched.
    pub fn apply_performance_impact(
        &mut self,
        event_id: &EventId,
        stats: &PerformanceStats,
        now: DateTime<Utc>,
    ) -> Result<(ImpactRecord, PriceChange), MarketError> {
        stats.validate()?;
        let breakdown = compute_impact(stats);

        let previous = self.impacts.get(event_id).map(|r| r.breakdown.total);
        if previous == Some(breakdown.total) {
            let unchanged = PriceChange {
                previous: self.current_price,
                current: self.current_price,
                timestamp: now,
            };
            if let Some(record) = self.impacts.get_mut(event_id) {
                record.stats = stats.clone();
                record.breakdown = breakdown;
                self.version += 1;
                tracing::debug!(instrument = %self.id, event = %event_id, "Performance impact already applied.");
                return Ok((record.clone(), unchanged));
            }
        }

        let base_price = match previous {
            Some(total) => price_before_impact(self.current_price, total)
                .ok_or(MarketError::InvalidPrice(self.current_price))?,
            None => self.current_price,
        };
        let new_price = price_after_impact(base_price, breakdown.total);

        let change = self.record_price(new_price, now)?;
        let record = ImpactRecord {
            event_id: event_id.clone(),
            stats: stats.clone(),
            breakdown,
            base_price: base_price
                .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero),
            resulting_price: new_price,
            applied_at: change.timestamp,
        };
        self.impacts.insert(event_id.clone(), record.clone());

        tracing::info!(
            instrument = %self.id,
            event = %event_id,
            impact = %breakdown.total,
            base = %base_price,
            price = %new_price,
            "Performance impact applied."
        );
        Ok((record, change))
    }

    /// Schedules an IPO window. It must not overlap another live window.
    pub fn open_ipo(
        &mut self,
        event_id: EventId,
        base_price: Decimal,
        max_price: Decimal,
        units: u64,
        opens_at: DateTime<Utc>,
        closes_at: DateTime<Utc>,
    ) -> Result<IpoWindow, MarketError> {
        if closes_at <= opens_at {
            return Err(MarketError::InvalidWindow(
                "closing time must be after opening time".to_string(),
            ));
        }
        if base_price <= Decimal::ZERO {
            return Err(MarketError::InvalidWindow(format!(
                "base price must be positive, got {}",
                base_price
            )));
        }
        if base_price > max_price {
            return Err(MarketError::InvalidWindow(format!(
                "base price {} exceeds max price {}",
                base_price, max_price
            )));
        }
        if units == 0 {
            return Err(MarketError::InvalidWindow(
                "a window must offer at least one unit".to_string(),
            ));
        }
        if self.ipo_windows.iter().any(|w| w.event_id == event_id) {
            return Err(MarketError::InvalidWindow(format!(
                "event {} already has a window",
                event_id
            )));
        }
        if let Some(clash) = self
            .ipo_windows
            .iter()
            .find(|w| w.status != IpoStatus::Cancelled && w.overlaps(opens_at, closes_at))
        {
            return Err(MarketError::InvalidWindow(format!(
                "overlaps the window for event {}",
                clash.event_id
            )));
        }

        let window = IpoWindow {
            event_id,
            base_price,
            max_price,
            total_units: units,
            available_units: units,
            sold_units: 0,
            opens_at,
            closes_at,
            status: IpoStatus::Upcoming,
        };
        self.ipo_windows.push(window.clone());
        self.version += 1;
        tracing::info!(instrument = %self.id, event = %window.event_id, units, "IPO window scheduled.");
        Ok(window)
    }

    /// Reserves `units` from the event's active window and issues them.
    /// All or nothing. Returns the unit (base) price.
    pub fn allocate_ipo(
        &mut self,
        event_id: &EventId,
        units: u64,
        now: DateTime<Utc>,
    ) -> Result<Decimal, MarketError> {
        if units == 0 {
            return Err(MarketError::ZeroQuantity);
        }
        if self.status == TradingStatus::Delisted {
            return Err(MarketError::TradingSuspended {
                instrument_id: self.id.clone(),
                status: self.status,
            });
        }

        let headroom = self.total_supply - self.circulating_supply;
        let instrument_id = self.id.clone();
        let window = self
            .ipo_windows
            .iter_mut()
            .find(|w| &w.event_id == event_id)
            .filter(|w| w.status_at(now) == IpoStatus::Active)
            .ok_or_else(|| MarketError::NoActiveWindow {
                instrument_id,
                event_id: event_id.clone(),
            })?;
        window.refresh(now);

        let available = window.available_units.min(headroom);
        if units > available {
            return Err(MarketError::InsufficientSupply {
                requested: units,
                available,
            });
        }

        window.available_units -= units;
        window.sold_units += units;
        let base_price = window.base_price;

        self.circulating_supply += units;
        self.refresh_market_cap();
        self.version += 1;
        Ok(base_price)
    }

    /// Reverses an allocation. Used for compensation only.
    pub fn release_ipo(&mut self, event_id: &EventId, units: u64) -> Result<(), MarketError> {
        let window = self
            .ipo_windows
            .iter_mut()
            .find(|w| &w.event_id == event_id)
            .ok_or_else(|| MarketError::WindowNotFound(event_id.clone()))?;
        if units > window.sold_units || units > self.circulating_supply {
            return Err(MarketError::InvalidSupply(format!(
                "cannot release {} units, only {} sold",
                units, window.sold_units
            )));
        }

        window.sold_units -= units;
        window.available_units += units;
        self.circulating_supply -= units;
        self.refresh_market_cap();
        self.version += 1;
        tracing::warn!(instrument = %self.id, event = %event_id, units, "IPO allocation released.");
        Ok(())
    }

    pub fn cancel_ipo(
        &mut self,
        event_id: &EventId,
        now: DateTime<Utc>,
    ) -> Result<IpoWindow, MarketError> {
        let window = self
            .ipo_windows
            .iter_mut()
            .find(|w| &w.event_id == event_id)
            .ok_or_else(|| MarketError::WindowNotFound(event_id.clone()))?;

        match window.refresh(now) {
            IpoStatus::Upcoming | IpoStatus::Active => {
                window.status = IpoStatus::Cancelled;
                let cancelled = window.clone();
                self.version += 1;
                Ok(cancelled)
            }
            other => Err(MarketError::InvalidTransition(format!(
                "cannot cancel an IPO window that is {:?}",
                other
            ))),
        }
    }

    /// The ACTIVE window, or else the next UPCOMING one.
    pub fn current_ipo(&self, now: DateTime<Utc>) -> Option<IpoWindow> {
        let refreshed = |w: &IpoWindow| {
            let mut w = w.clone();
            w.refresh(now);
            w
        };
        self.ipo_windows
            .iter()
            .find(|w| w.status_at(now) == IpoStatus::Active)
            .map(refreshed)
            .or_else(|| {
                self.ipo_windows
                    .iter()
                    .filter(|w| w.status_at(now) == IpoStatus::Upcoming)
                    .min_by_key(|w| w.opens_at)
                    .map(refreshed)
            })
    }

    /// Returns the previous status.
    pub fn set_trading_status(&mut self, next: TradingStatus) -> Result<TradingStatus, MarketError> {
        let previous = self.status;
        if !previous.can_transition_to(next) {
            return Err(MarketError::InvalidTransition(format!(
                "trading status {:?} -> {:?}",
                previous, next
            )));
        }
        self.status = next;
        self.version += 1;
        tracing::info!(instrument = %self.id, ?previous, current = ?next, "Trading status changed.");
        Ok(previous)
    }

    pub fn ensure_tradable(&self) -> Result<(), MarketError> {
        match self.status {
            TradingStatus::Active => Ok(()),
            status => Err(MarketError::TradingSuspended {
                instrument_id: self.id.clone(),
                status,
            }),
        }
    }

    /// Brings `quantity` new units into circulation.
    pub fn issue(&mut self, quantity: u64) -> Result<(), MarketError> {
        if quantity == 0 {
            return Err(MarketError::ZeroQuantity);
        }
        let available = self.total_supply - self.circulating_supply;
        if quantity > available {
            return Err(MarketError::InsufficientSupply {
                requested: quantity,
                available,
            });
        }
        self.circulating_supply += quantity;
        self.refresh_market_cap();
        self.version += 1;
        Ok(())
    }

    /// Takes `quantity` units out of circulation.
    pub fn redeem(&mut self, quantity: u64) -> Result<(), MarketError> {
        if quantity > self.circulating_supply {
            return Err(MarketError::InvalidSupply(format!(
                "cannot redeem {} units, only {} circulating",
                quantity, self.circulating_supply
            )));
        }
        self.circulating_supply -= quantity;
        self.refresh_market_cap();
        self.version += 1;
        Ok(())
    }

    pub fn record_volume(&mut self, quantity: u64) {
        self.volume.daily += quantity;
        self.volume.weekly += quantity;
        self.volume.monthly += quantity;
        self.version += 1;
    }

    pub fn reset_volume(&mut self, window: Timeframe) {
        match window {
            Timeframe::Daily => self.volume.daily = 0,
            Timeframe::Weekly => self.volume.weekly = 0,
            Timeframe::Monthly => self.volume.monthly = 0,
        }
        self.version += 1;
    }

    pub fn price_history(&self, timeframe: Timeframe, now: DateTime<Utc>) -> Vec<PricePoint> {
        self.history.within(timeframe, now).to_vec()
    }

    fn refresh_market_cap(&mut self) {
        self.market_cap = self.current_price * Decimal::from(self.circulating_supply);
    }
}
