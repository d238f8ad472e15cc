//! Fixed-fractional risk sizer.
//!
//! Risk a fixed fraction of capital against the distance to the stop-loss.

use crate::strategy::StrategyConfig;

/// Size used when no stop-loss distance is configured.
pub const NO_STOP_FRACTION: f64 = 0.1;

/// Fixed-fractional sizer
///
/// # Formula
/// ```text
/// size_fraction = min(max_position_fraction, risk_per_trade / stop_loss_fraction)
/// ```
///
/// # Example
/// - Risk per trade: 2%
/// - Stop-loss distance: 3%
/// - Raw size: 0.02 / 0.03 = 66.7% of capital
/// - Cap at 25% → size_fraction = 0.25
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedFractionalSizer {
    pub risk_per_trade: f64,
    pub stop_loss_fraction: f64,
    pub max_position_fraction: f64,
}

impl FixedFractionalSizer {
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            risk_per_trade: config.risk_per_trade,
            stop_loss_fraction: config.stop_loss_fraction,
            max_position_fraction: config.max_position_fraction,
        }
    }

    /// Fraction of the capital basis to commit.
    ///
    /// Falls back to `min(max, 0.1)` when the stop distance is not positive.
    /// Never negative.
    pub fn size_fraction(&self) -> f64 {
        if self.stop_loss_fraction <= 0.0 {
            return self.max_position_fraction.min(NO_STOP_FRACTION);
        }
        let raw = self.risk_per_trade / self.stop_loss_fraction;
        self.max_position_fraction.min(raw.max(0.0))
    }

    /// Notional committed out of `capital`.
    pub fn notional(&self, capital: f64) -> f64 {
        capital * self.size_fraction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizer(risk: f64, stop: f64, max: f64) -> FixedFractionalSizer {
        FixedFractionalSizer {
            risk_per_trade: risk,
            stop_loss_fraction: stop,
            max_position_fraction: max,
        }
    }

    #[test]
    fn default_config_is_capped() {
        let s = FixedFractionalSizer::from_config(&StrategyConfig::default());
        assert_eq!(s.size_fraction(), 0.25);
        assert_eq!(s.notional(1000.0), 250.0);
    }

    #[test]
    fn below_cap_uses_risk_ratio() {
        let s = sizer(0.01, 0.05, 0.5);
        assert!((s.size_fraction() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn zero_stop_falls_back() {
        assert_eq!(sizer(0.02, 0.0, 0.25).size_fraction(), 0.1);
        assert_eq!(sizer(0.02, 0.0, 0.05).size_fraction(), 0.05);
    }

    #[test]
    fn negative_risk_clamps_to_zero() {
        assert_eq!(sizer(-0.02, 0.03, 0.25).size_fraction(), 0.0);
    }
}
