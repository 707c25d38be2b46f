use crate::error::RiskError;
use crate::{TradeGuard, TradeRequest};
use configuration::{MarketHours, TradingLimits};

/// Enforces the configured per-trade quantity bounds, the per-instrument daily
/// volume cap and, when enabled, market hours.
#[derive(Debug, Clone)]
pub struct LimitsGuard {
    limits: TradingLimits,
    hours: MarketHours,
}

impl LimitsGuard {
    /// Creates a new `LimitsGuard` with the given configuration parameters.
    pub fn new(limits: TradingLimits, hours: MarketHours) -> Result<Self, RiskError> {
        // Validate that the limits are logical.
        if limits.min_quantity_per_trade == 0 {
            return Err(RiskError::InvalidParameters(
                "min_quantity_per_trade must be at least 1".to_string(),
            ));
        }
        if limits.min_quantity_per_trade > limits.max_quantity_per_trade {
            return Err(RiskError::InvalidParameters(
                "min_quantity_per_trade must not exceed max_quantity_per_trade".to_string(),
            ));
        }
        if hours.enforce && hours.open >= hours.close {
            return Err(RiskError::InvalidParameters(
                "market opening time must be before closing time".to_string(),
            ));
        }
        Ok(Self { limits, hours })
    }
}

impl TradeGuard for LimitsGuard {
    fn check(&self, request: &TradeRequest<'_>) -> Result<(), RiskError> {
        if request.quantity < self.limits.min_quantity_per_trade {
            return Err(RiskError::BelowMinimumQuantity {
                quantity: request.quantity,
                minimum: self.limits.min_quantity_per_trade,
            });
        }
        if request.quantity > self.limits.max_quantity_per_trade {
            return Err(RiskError::AboveMaximumQuantity {
                quantity: request.quantity,
                maximum: self.limits.max_quantity_per_trade,
            });
        }
        if !self.hours.is_open(request.at) {
            return Err(RiskError::MarketClosed(request.at));
        }
        if request.daily_volume.saturating_add(request.quantity) > self.limits.max_daily_volume {
            tracing::warn!(
                instrument = %request.instrument_id,
                traded = request.daily_volume,
                requested = request.quantity,
                "Daily volume cap reached."
            );
            return Err(RiskError::DailyVolumeExceeded {
                traded: request.daily_volume,
                requested: request.quantity,
                cap: self.limits.max_daily_volume,
            });
        }
        Ok(())
    }
}
