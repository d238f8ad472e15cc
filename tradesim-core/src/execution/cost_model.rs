//! Cost model: basis-point slippage and per-side fees.
//!
//! Slippage is always adverse: buys fill above the reference price, sells
//! below it. Fees are charged once on entry and once on exit, each
//! `notional * fee_bps / 10_000`.

use crate::strategy::StrategyConfig;

const BPS: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    /// Fee per side in basis points.
    pub fee_bps: f64,
    /// Slippage per side in basis points (e.g., 2 = 0.02%).
    pub slippage_bps: f64,
}

impl CostModel {
    pub fn new(fee_bps: f64, slippage_bps: f64) -> Self {
        Self {
            fee_bps,
            slippage_bps,
        }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.fee_bps, config.slippage_bps)
    }

    /// Buy fill price. Unchanged when slippage is not positive.
    pub fn entry_price(&self, price: f64) -> f64 {
        if self.slippage_bps <= 0.0 {
            return price;
        }
        price * (1.0 + self.slippage_bps / BPS)
    }

    /// Sell fill price. Unchanged when slippage is not positive.
    pub fn exit_price(&self, price: f64) -> f64 {
        if self.slippage_bps <= 0.0 {
            return price;
        }
        price * (1.0 - self.slippage_bps / BPS)
    }

    /// Entry plus exit fee on `notional`. Zero when the fee rate is not positive.
    pub fn round_trip_fee(&self, notional: f64) -> f64 {
        if self.fee_bps <= 0.0 {
            return 0.0;
        }
        notional * (self.fee_bps / BPS) * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slippage_is_adverse() {
        let m = CostModel::new(0.0, 10.0);
        assert!((m.entry_price(100.0) - 100.1).abs() < 1e-9);
        assert!((m.exit_price(100.0) - 99.9).abs() < 1e-9);
    }

    #[test]
    fn non_positive_slippage_is_ignored() {
        let m = CostModel::new(0.0, -5.0);
        assert_eq!(m.entry_price(100.0), 100.0);
        assert_eq!(m.exit_price(100.0), 100.0);
    }

    #[test]
    fn fee_is_charged_both_sides() {
        let m = CostModel::new(5.0, 0.0);
        assert!((m.round_trip_fee(250.0) - 0.25).abs() < 1e-12);
        assert_eq!(CostModel::new(0.0, 0.0).round_trip_fee(250.0), 0.0);
    }
}
