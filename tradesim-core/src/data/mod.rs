//! Candle ingestion boundary: raw records in, canonical candles out.

pub mod normalize;

pub use normalize::{normalize_candles, CandleNormalizer, NormalizeReport};
