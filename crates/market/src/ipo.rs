use chrono::{DateTime, Utc};
use core_types::{EventId, IpoStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A time-boxed primary issuance tied to an event.
///
/// `available_units + sold_units == total_units` always holds. Status is
/// refreshed lazily against the clock, except that CANCELLED is sticky.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpoWindow {
    pub event_id: EventId,
    pub base_price: Decimal,
    pub max_price: Decimal,
    pub total_units: u64,
    pub available_units: u64,
    pub sold_units: u64,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub status: IpoStatus,
}

impl IpoWindow {
    pub fn status_at(&self, now: DateTime<Utc>) -> IpoStatus {
        if self.status == IpoStatus::Cancelled {
            IpoStatus::Cancelled
        } else if now < self.opens_at {
            IpoStatus::Upcoming
        } else if now < self.closes_at {
            IpoStatus::Active
        } else {
            IpoStatus::Completed
        }
    }

    pub fn refresh(&mut self, now: DateTime<Utc>) -> IpoStatus {
        self.status = self.status_at(now);
        self.status
    }

    /// True if the half-open ranges `[opens_at, closes_at)` intersect.
    pub fn overlaps(&self, opens_at: DateTime<Utc>, closes_at: DateTime<Utc>) -> bool {
        self.opens_at < closes_at && opens_at < self.closes_at
    }
}
