use crate::error::CoreError;
use crate::ids::{EventId, InstrumentId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-match statistics for one performer, as delivered by the match-event source.
///
/// Batting and bowling figures are optional because a performer may not have
/// batted or bowled. Fielding counts default to zero. `balls`, `fours`, `sixes`,
/// `overs` and `maidens` are carried for auditability but do not enter the
/// price-impact formula.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceStats {
    pub runs: Option<u32>,
    pub balls: Option<u32>,
    pub fours: Option<u32>,
    pub sixes: Option<u32>,
    pub strike_rate: Option<Decimal>,
    pub overs: Option<Decimal>,
    pub maidens: Option<u32>,
    pub wickets: Option<u32>,
    pub economy: Option<Decimal>,
    pub catches: u32,
    pub runouts: u32,
    pub stumpings: u32,
}

impl PerformanceStats {
    /// Rejects figures that cannot come from a real scorecard.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(sr) = self.strike_rate {
            if sr.is_sign_negative() {
                return Err(CoreError::InvalidInput(
                    "strikeRate".to_string(),
                    format!("must not be negative, got {}", sr),
                ));
            }
        }
        if let Some(economy) = self.economy {
            if economy.is_sign_negative() {
                return Err(CoreError::InvalidInput(
                    "economy".to_string(),
                    format!("must not be negative, got {}", economy),
                ));
            }
        }
        if let Some(overs) = self.overs {
            if overs.is_sign_negative() {
                return Err(CoreError::InvalidInput(
                    "overs".to_string(),
                    format!("must not be negative, got {}", overs),
                ));
            }
        }
        Ok(())
    }
}

/// One performer's statistics from one event, addressed to the instrument that tracks them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEvent {
    pub event_id: EventId,
    pub instrument_id: InstrumentId,
    pub stats: PerformanceStats,
}
