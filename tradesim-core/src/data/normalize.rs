//! Tolerant candle normalization.
//!
//! Free market-data feeds disagree on field names (`c`, `close`, `C`) and on
//! whether numbers arrive as JSON numbers or strings. Every record with a
//! resolvable, finite close becomes a [`Candle`]; everything else is dropped
//! without error. Output is sorted ascending by timestamp with duplicate
//! timestamps removed (first occurrence wins).

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::Candle;

const TIMESTAMP_KEYS: &[&str] = &["t", "time", "timestamp"];
const OPEN_KEYS: &[&str] = &["o", "open", "O"];
const HIGH_KEYS: &[&str] = &["h", "high", "H"];
const LOW_KEYS: &[&str] = &["l", "low", "L"];
const CLOSE_KEYS: &[&str] = &["c", "close", "C"];
const VOLUME_KEYS: &[&str] = &["v", "volume", "V"];

/// Normalized candles plus the number of records that were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeReport {
    pub candles: Vec<Candle>,
    pub dropped: usize,
}

/// Normalizer for loosely-typed candle records.
pub struct CandleNormalizer;

impl CandleNormalizer {
    /// Normalize raw records into a canonical candle sequence.
    pub fn normalize(records: &[Value]) -> NormalizeReport {
        let mut candles: Vec<Candle> = records
            .iter()
            .filter_map(|record| record.as_object().and_then(Self::normalize_record))
            .collect();
        let parsed = candles.len();

        // Stable sort: records without a timestamp keep their relative order
        // and sort ahead of timestamped ones.
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by(|later, earlier| {
            later.timestamp.is_some() && later.timestamp == earlier.timestamp
        });

        let dropped = records.len() - candles.len();
        if dropped > 0 {
            debug!(
                total = records.len(),
                unparsable = records.len() - parsed,
                duplicates = parsed - candles.len(),
                "dropped candle records during normalization"
            );
        }

        NormalizeReport { candles, dropped }
    }

    /// Normalize a single record. `None` if it has no usable close price.
    pub fn normalize_record(record: &Map<String, Value>) -> Option<Candle> {
        let close = numeric_field(record, CLOSE_KEYS).filter(|c| c.is_finite())?;
        Some(Candle {
            timestamp: numeric_field(record, TIMESTAMP_KEYS)
                .filter(|t| t.is_finite())
                .map(|t| t as i64),
            open: numeric_field(record, OPEN_KEYS),
            high: numeric_field(record, HIGH_KEYS),
            low: numeric_field(record, LOW_KEYS),
            close,
            volume: numeric_field(record, VOLUME_KEYS),
        })
    }
}

/// Convenience wrapper returning only the candles.
pub fn normalize_candles(records: &[Value]) -> Vec<Candle> {
    CandleNormalizer::normalize(records).candles
}

/// First key variant holding a number or a numeric string.
///
/// A present-but-unparsable value falls through to the next variant.
fn numeric_field(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
