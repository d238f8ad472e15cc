//! Candle: the canonical market data unit after normalization.

use serde::{Deserialize, Serialize};

/// OHLCV candle for a single symbol and interval.
///
/// Only `close` is mandatory: upstream feeds frequently omit the other
/// fields, and nothing in the engine needs them. `timestamp` is in the
/// exchange's own time unit (usually epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: Option<i64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Candle {
    /// Candle with only a timestamp and close price.
    pub fn from_close(timestamp: i64, close: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

/// Closing prices of a candle sequence, in order.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Build synthetic candles from close prices, one minute apart.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle::from_close(1_700_000_000_000 + i as i64 * 60_000, close))
        .collect()
}
