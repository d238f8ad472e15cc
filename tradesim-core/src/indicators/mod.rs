//! Indicator series over closing prices.
//!
//! Every series is computed once per run, in full, with one entry per candle
//! (`None` before the value is defined). Signal evaluation compares a value
//! against its immediate predecessor, so the whole series is kept rather than
//! only the latest value.

pub mod rsi;
pub mod sma;

pub use rsi::rsi_series;
pub use sma::sma_series;

use crate::strategy::{StrategyConfig, StrategyKind};

pub const DEFAULT_SMA_FAST: f64 = 5.0;
pub const DEFAULT_SMA_SLOW: f64 = 20.0;
pub const DEFAULT_RSI_PERIOD: f64 = 14.0;
pub const DEFAULT_RSI_LOWER: f64 = 30.0;
pub const DEFAULT_RSI_UPPER: f64 = 70.0;

/// Precomputed indicator output for one strategy over one close series.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorSeries {
    /// Fast and slow simple moving averages.
    MovingAveragePair {
        fast: Vec<Option<f64>>,
        slow: Vec<Option<f64>>,
        warmup: usize,
    },
    /// Wilder RSI with its entry/exit thresholds.
    Rsi {
        values: Vec<Option<f64>>,
        lower: f64,
        upper: f64,
        warmup: usize,
    },
}

impl IndicatorSeries {
    /// Build the series selected by `config.kind`.
    ///
    /// Unknown kinds use the moving-average pair with default windows.
    pub fn build(closes: &[f64], config: &StrategyConfig) -> Self {
        match &config.kind {
            StrategyKind::Rsi => {
                let period = window(config.param("period", DEFAULT_RSI_PERIOD));
                IndicatorSeries::Rsi {
                    values: rsi_series(closes, period),
                    lower: config.param("lower", DEFAULT_RSI_LOWER),
                    upper: config.param("upper", DEFAULT_RSI_UPPER),
                    warmup: period.saturating_add(1),
                }
            }
            StrategyKind::SmaCross => {
                let fast = window(config.param("fast", DEFAULT_SMA_FAST));
                let slow = window(config.param("slow", DEFAULT_SMA_SLOW));
                Self::moving_average_pair(closes, fast, slow)
            }
            StrategyKind::Unknown(name) => {
                tracing::debug!(kind = %name, "unknown strategy kind, using sma_cross defaults");
                Self::moving_average_pair(
                    closes,
                    window(DEFAULT_SMA_FAST),
                    window(DEFAULT_SMA_SLOW),
                )
            }
        }
    }

    fn moving_average_pair(closes: &[f64], fast: usize, slow: usize) -> Self {
        IndicatorSeries::MovingAveragePair {
            fast: sma_series(closes, fast),
            slow: sma_series(closes, slow),
            warmup: fast.max(slow).saturating_add(1),
        }
    }

    /// First index at which the strategy is evaluated.
    pub fn warmup(&self) -> usize {
        match self {
            IndicatorSeries::MovingAveragePair { warmup, .. } => *warmup,
            IndicatorSeries::Rsi { warmup, .. } => *warmup,
        }
    }

    /// Number of entries (equal to the number of closes).
    pub fn len(&self) -> usize {
        match self {
            IndicatorSeries::MovingAveragePair { fast, .. } => fast.len(),
            IndicatorSeries::Rsi { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Window length from a float parameter: truncated toward zero, negatives and
/// NaN become 0.
fn window(value: f64) -> usize {
    if value.is_finite() && value > 0.0 {
        value.trunc() as usize
    } else {
        0
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    fn closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn sma_pair_uses_params_and_warmup() {
        let config = StrategyConfig::sma_cross(3, 7);
        let series = IndicatorSeries::build(&closes(30), &config);
        match &series {
            IndicatorSeries::MovingAveragePair { fast, slow, warmup } => {
                assert_eq!(*warmup, 8);
                assert!(fast[1].is_none() && fast[2].is_some());
                assert!(slow[5].is_none() && slow[6].is_some());
            }
            other => panic!("expected moving-average pair, got {other:?}"),
        }
        assert_eq!(series.len(), 30);
    }

    #[test]
    fn default_sma_warmup_is_21() {
        let series = IndicatorSeries::build(&closes(30), &StrategyConfig::default());
        assert_eq!(series.warmup(), 21);
    }

    #[test]
    fn rsi_series_carries_thresholds() {
        let config = StrategyConfig::rsi(7, 25.0, 75.0);
        match IndicatorSeries::build(&closes(30), &config) {
            IndicatorSeries::Rsi { values, lower, upper, warmup } => {
                assert_eq!(warmup, 8);
                assert_eq!((lower, upper), (25.0, 75.0));
                assert!(values[6].is_none() && values[7].is_some());
            }
            other => panic!("expected RSI, got {other:?}"),
        }
    }

    #[test]
    fn rsi_defaults_when_params_missing() {
        let config = StrategyConfig {
            kind: StrategyKind::Rsi,
            ..StrategyConfig::default()
        };
        let series = IndicatorSeries::build(&closes(30), &config);
        assert_eq!(series.warmup(), 15);
    }

    #[test]
    fn unknown_kind_falls_back_to_default_sma() {
        let config = StrategyConfig {
            kind: StrategyKind::from("macd"),
            ..StrategyConfig::default()
        }
        .with_param("fast", 2.0);
        let series = IndicatorSeries::build(&closes(30), &config);
        assert!(matches!(series, IndicatorSeries::MovingAveragePair { warmup: 21, .. }));
    }

    #[test]
    fn oversized_windows_saturate_warmup() {
        let sma = StrategyConfig::sma_cross(5, 20).with_param("slow", 1e30);
        assert_eq!(IndicatorSeries::build(&closes(30), &sma).warmup(), usize::MAX);

        let rsi = StrategyConfig::rsi(14, 30.0, 70.0).with_param("period", 1e30);
        match IndicatorSeries::build(&closes(30), &rsi) {
            IndicatorSeries::Rsi { values, warmup, .. } => {
                assert_eq!(warmup, usize::MAX);
                assert!(values.iter().all(Option::is_none));
            }
            other => panic!("expected RSI, got {other:?}"),
        }
    }

    #[test]
    fn fractional_and_negative_windows() {
        assert_eq!(window(5.9), 5);
        assert_eq!(window(-3.0), 0);
        assert_eq!(window(f64::NAN), 0);

        let config = StrategyConfig::sma_cross(0, 0).with_param("fast", -2.0);
        match IndicatorSeries::build(&closes(10), &config) {
            IndicatorSeries::MovingAveragePair { fast, slow, .. } => {
                assert!(fast.iter().all(Option::is_none));
                assert!(slow.iter().all(Option::is_none));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
