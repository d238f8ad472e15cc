//! Single-step evaluation of the most recent candle.
//!
//! The paper trader runs this once per external tick instead of replaying the
//! whole series: the indicator series is still built in full so the latest
//! value can be compared against its predecessor.

use thiserror::Error;

use crate::domain::{closes, Candle};
use crate::indicators::IndicatorSeries;
use crate::signals::{signal_at, Signal};
use crate::strategy::StrategyConfig;

/// Why a tick could not be evaluated. An outcome, not a crash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaperTickError {
    #[error("No candle data")]
    NoData,
    #[error("Not enough data for strategy")]
    NotEnoughData { candles: usize, warmup: usize },
}

/// Signal and price at the last candle.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSignal {
    pub index: usize,
    pub price: f64,
    pub timestamp: Option<i64>,
    pub signal: Signal,
}

/// Classify the last candle of `candles` under `config`.
///
/// Requires strictly more candles than the strategy's warmup.
pub fn latest_signal(
    candles: &[Candle],
    config: &StrategyConfig,
) -> Result<LatestSignal, PaperTickError> {
    let Some(last) = candles.last() else {
        return Err(PaperTickError::NoData);
    };

    let series = IndicatorSeries::build(&closes(candles), config);
    let warmup = series.warmup();
    if candles.len() <= warmup {
        return Err(PaperTickError::NotEnoughData {
            candles: candles.len(),
            warmup,
        });
    }

    let index = candles.len() - 1;
    Ok(LatestSignal {
        index,
        price: last.close,
        timestamp: last.timestamp,
        signal: signal_at(&series, index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::make_candles;

    #[test]
    fn empty_is_no_data() {
        assert_eq!(
            latest_signal(&[], &StrategyConfig::default()),
            Err(PaperTickError::NoData)
        );
    }

    #[test]
    fn warmup_must_be_exceeded() {
        let config = StrategyConfig::sma_cross(2, 3);
        let err = latest_signal(&make_candles(&[1.0, 2.0, 3.0, 4.0]), &config).unwrap_err();
        assert_eq!(err, PaperTickError::NotEnoughData { candles: 4, warmup: 4 });
        assert_eq!(err.to_string(), "Not enough data for strategy");
    }

    #[test]
    fn huge_window_is_not_enough_data() {
        let config = StrategyConfig::sma_cross(2, 3).with_param("slow", 1e30);
        let err = latest_signal(&make_candles(&[100.0; 30]), &config).unwrap_err();
        assert_eq!(err, PaperTickError::NotEnoughData { candles: 30, warmup: usize::MAX });
    }

    #[test]
    fn detects_cross_on_last_candle() {
        let mut closes = vec![100.0; 10];
        closes.push(103.0);
        let config = StrategyConfig::sma_cross(2, 3);
        let latest = latest_signal(&make_candles(&closes), &config).unwrap();
        assert_eq!(latest.index, 10);
        assert_eq!(latest.price, 103.0);
        assert_eq!(latest.signal, Signal::Enter);
    }
}
