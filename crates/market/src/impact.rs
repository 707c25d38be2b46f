//! The deterministic price-impact formula.
//!
//! ```text
//! batting  = (runs / 50) × 5 + (strikeRate − 100) × 0.02     if runs > 0
//! bowling  = wickets × 3 + (6 − economy) × 0.5                if wickets > 0
//!            (the economy term only when economy < 6)
//! fielding = catches × 1 + runouts × 1.5 + stumpings × 2
//! impact   = clamp(batting + bowling + fielding, −20, +20)     percent
//! ```

use core_types::PerformanceStats;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub const MAX_IMPACT_PERCENT: Decimal = dec!(20);

/// Decimal places kept on prices derived from an impact.
pub const PRICE_SCALE: u32 = 4;

/// The components of one impact calculation, all in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImpactBreakdown {
    pub batting: Decimal,
    pub bowling: Decimal,
    pub fielding: Decimal,
    /// The clamped sum.
    pub total: Decimal,
}

pub fn compute_impact(stats: &PerformanceStats) -> ImpactBreakdown {
    let batting = match stats.runs {
        Some(runs) if runs > 0 => {
            let strike_rate = stats.strike_rate.unwrap_or(dec!(100));
            Decimal::from(runs) / dec!(50) * dec!(5) + (strike_rate - dec!(100)) * dec!(0.02)
        }
        _ => Decimal::ZERO,
    };

    let bowling = match stats.wickets {
        Some(wickets) if wickets > 0 => {
            let economy_bonus = match stats.economy {
                Some(economy) if economy < dec!(6) => (dec!(6) - economy) * dec!(0.5),
                _ => Decimal::ZERO,
            };
            Decimal::from(wickets) * dec!(3) + economy_bonus
        }
        _ => Decimal::ZERO,
    };

    let fielding = Decimal::from(stats.catches)
        + Decimal::from(stats.runouts) * dec!(1.5)
        + Decimal::from(stats.stumpings) * dec!(2);

    let total = (batting + bowling + fielding).clamp(-MAX_IMPACT_PERCENT, MAX_IMPACT_PERCENT);

    ImpactBreakdown {
        batting,
        bowling,
        fielding,
        total,
    }
}

/// `base × (1 + impact / 100)`, rounded to [`PRICE_SCALE`] places.
pub fn price_after_impact(base: Decimal, impact_percent: Decimal) -> Decimal {
    (base * (Decimal::ONE + impact_percent / dec!(100)))
        .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// The price before an impact of `impact_percent` was applied to `price`.
///
/// Unrounded. `None` only for an impact of exactly −100 percent, which the
/// clamp rules out.
pub fn price_before_impact(price: Decimal, impact_percent: Decimal) -> Option<Decimal> {
    (price * dec!(100)).checked_div(dec!(100) + impact_percent)
}
