use chrono::{DateTime, Duration, Utc};
use core_types::Timeframe;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Percentage change over the trailing day, week and month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Performance {
    pub daily: Decimal,
    pub weekly: Decimal,
    pub monthly: Decimal,
}

/// Append-only price log with strictly increasing timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Appends `price`, nudging the timestamp forward by a microsecond if the
    /// clock has not moved past the previous entry. Returns the stored point.
    pub fn push(&mut self, price: Decimal, now: DateTime<Utc>) -> PricePoint {
        let timestamp = match self.points.last() {
            Some(last) if now <= last.timestamp => last.timestamp + Duration::microseconds(1),
            _ => now,
        };
        let point = PricePoint { price, timestamp };
        self.points.push(point);
        point
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Entries whose timestamp falls within the trailing `timeframe` from `now`.
    pub fn within(&self, timeframe: Timeframe, now: DateTime<Utc>) -> &[PricePoint] {
        let start = now - timeframe.duration();
        let from = self.points.partition_point(|p| p.timestamp < start);
        &self.points[from..]
    }

    /// Percentage change from the earliest entry inside each trailing window
    /// to `current`. Zero when that entry's price is zero or the window is empty.
    pub fn performance(&self, current: Decimal, now: DateTime<Utc>) -> Performance {
        Performance {
            daily: self.change_over(Timeframe::Daily, current, now),
            weekly: self.change_over(Timeframe::Weekly, current, now),
            monthly: self.change_over(Timeframe::Monthly, current, now),
        }
    }

    fn change_over(&self, timeframe: Timeframe, current: Decimal, now: DateTime<Utc>) -> Decimal {
        match self.within(timeframe, now).first() {
            Some(start) if !start.price.is_zero() => {
                ((current - start.price) / start.price * dec!(100)).round_dp(2)
            }
            _ => Decimal::ZERO,
        }
    }

    /// True if timestamps are strictly increasing.
    pub fn is_strictly_ordered(&self) -> bool {
        self.points.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
    }
}
