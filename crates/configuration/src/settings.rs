use crate::error::ConfigError;
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration structure for the exchange core.
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trading: TradingLimits,
    pub wallet: WalletLimits,
    pub market_hours: MarketHours,
    pub logging: LoggingConfig,
    pub notifications: NotificationConfig,
}

impl Config {
    /// Checks cross-field consistency that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.trading;
        if t.min_quantity_per_trade == 0 {
            return Err(ConfigError::ValidationError(
                "trading.min_quantity_per_trade must be at least 1".to_string(),
            ));
        }
        if t.min_quantity_per_trade > t.max_quantity_per_trade {
            return Err(ConfigError::ValidationError(format!(
                "trading.min_quantity_per_trade ({}) exceeds max_quantity_per_trade ({})",
                t.min_quantity_per_trade, t.max_quantity_per_trade
            )));
        }

        let w = &self.wallet;
        for (name, value) in [
            ("min_deposit", w.min_deposit),
            ("min_withdrawal", w.min_withdrawal),
            ("max_per_operation", w.max_per_operation),
            ("daily_deposit", w.daily_deposit),
            ("daily_withdrawal", w.daily_withdrawal),
        ] {
            if value <= Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "wallet.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if w.min_deposit > w.max_per_operation || w.min_withdrawal > w.max_per_operation {
            return Err(ConfigError::ValidationError(
                "wallet minimums must not exceed wallet.max_per_operation".to_string(),
            ));
        }

        if self.market_hours.open >= self.market_hours.close {
            return Err(ConfigError::ValidationError(
                "market_hours.open must be before market_hours.close".to_string(),
            ));
        }
        if self.notifications.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "notifications.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-trade and per-instrument trading limits enforced before a trade executes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingLimits {
    pub min_quantity_per_trade: u64,
    pub max_quantity_per_trade: u64,
    /// Maximum units traded per instrument per day, across all accounts.
    pub max_daily_volume: u64,
}

impl Default for TradingLimits {
    fn default() -> Self {
        Self {
            min_quantity_per_trade: 1,
            max_quantity_per_trade: 1000,
            max_daily_volume: 10_000,
        }
    }
}

/// Default per-account cash limits. Each ledger copies these at account opening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletLimits {
    pub min_deposit: Decimal,
    pub min_withdrawal: Decimal,
    /// Upper bound for any single deposit or withdrawal.
    pub max_per_operation: Decimal,
    pub daily_deposit: Decimal,
    pub daily_withdrawal: Decimal,
}

impl Default for WalletLimits {
    fn default() -> Self {
        Self {
            min_deposit: dec!(100),
            min_withdrawal: dec!(100),
            max_per_operation: dec!(50000),
            daily_deposit: dec!(50000),
            daily_withdrawal: dec!(25000),
        }
    }
}

/// Trading session in UTC. Only checked when `enforce` is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketHours {
    pub enforce: bool,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl MarketHours {
    /// Returns true if `at` falls within `[open, close)`. Always true when not enforced.
    pub fn is_open(&self, at: DateTime<Utc>) -> bool {
        if !self.enforce {
            return true;
        }
        let second_of_day = at.time().num_seconds_from_midnight();
        second_of_day >= self.open.num_seconds_from_midnight()
            && second_of_day < self.close.num_seconds_from_midnight()
    }
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            enforce: false,
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Output format of the stdout log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG` when set.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            directory: None,
            file_prefix: "crease.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Capacity of the broadcast channel feeding notification subscribers.
    pub channel_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}
