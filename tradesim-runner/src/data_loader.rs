//! Snapshot loading: read a saved candle snapshot and normalize it.
//!
//! A snapshot is a JSON document that is either an array of candle records
//! or an object whose `candles` field holds that array. Record keys vary by
//! exchange; normalization resolves them and drops records without a close.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use tradesim_core::data::{CandleNormalizer, NormalizeReport};

/// Errors from the snapshot loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot {path} holds neither a candle array nor an object with `candles`")]
    Shape { path: PathBuf },
}

/// Load and normalize the candles in the snapshot at `path`.
pub fn load_snapshot(path: &Path) -> Result<NormalizeReport, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: Value = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let report = parse_snapshot(&doc).ok_or_else(|| LoadError::Shape {
        path: path.to_path_buf(),
    })?;
    tracing::debug!(
        path = %path.display(),
        candles = report.candles.len(),
        dropped = report.dropped,
        "snapshot loaded"
    );
    Ok(report)
}

/// Normalize an in-memory snapshot document. `None` if the shape is wrong.
///
/// An object without `candles` counts as an empty snapshot.
pub fn parse_snapshot(doc: &Value) -> Option<NormalizeReport> {
    let empty = Vec::new();
    let records = match doc {
        Value::Array(records) => records,
        Value::Object(map) => match map.get("candles") {
            Some(Value::Array(records)) => records,
            None | Some(Value::Null) => &empty,
            Some(_) => return None,
        },
        _ => return None,
    };
    Some(CandleNormalizer::normalize(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn object_snapshot_with_exchange_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("BTC_1h.json");
        let doc = json!({
            "coin": "BTC",
            "candles": [
                {"t": 2000, "o": "1", "h": "2", "l": "0.5", "c": "1.5", "v": "10"},
                {"t": 1000, "c": 1.0},
                {"t": 3000, "o": 1.0}
            ]
        });
        fs::write(&path, doc.to_string()).unwrap();

        let report = load_snapshot(&path).unwrap();
        assert_eq!(report.dropped, 1);
        assert_eq!(report.candles.len(), 2);
        assert_eq!(report.candles[0].timestamp, Some(1000));
        assert_eq!(report.candles[1].close, 1.5);
    }

    #[test]
    fn array_snapshot() {
        let report = parse_snapshot(&json!([{"time": 5, "close": 10.0}])).unwrap();
        assert_eq!(report.candles.len(), 1);
    }

    #[test]
    fn object_without_candles_is_empty() {
        let report = parse_snapshot(&json!({"coin": "BTC"})).unwrap();
        assert!(report.candles.is_empty());
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        assert!(parse_snapshot(&json!(42)).is_none());
        assert!(parse_snapshot(&json!({"candles": "nope"})).is_none());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{oops").unwrap();
        assert!(matches!(load_snapshot(&path), Err(LoadError::Json { .. })));
        assert!(matches!(
            load_snapshot(&tmp.path().join("missing.json")),
            Err(LoadError::Io { .. })
        ));
    }
}
