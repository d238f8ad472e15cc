//! Backtesting engine: full replay over a candle series, and the single-step
//! evaluation the paper trader runs per tick.
//!
//! Pure: no I/O, no clock, no randomness, no caches. Identical inputs always
//! produce bit-identical results, so callers may run many backtests in
//! parallel over shared data.

pub mod backtest;
pub mod step;

pub use backtest::{run_backtest, MIN_CANDLES};
pub use step::{latest_signal, LatestSignal, PaperTickError};
