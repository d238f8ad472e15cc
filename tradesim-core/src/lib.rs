//! Tradesim Core: deterministic strategy backtesting engine.
//!
//! This crate contains the pure engine:
//! - Candle normalization from loosely-typed feed records
//! - Indicator series (SMA pair, Wilder RSI)
//! - Stateless signal classification
//! - Single-position state machine with slippage and fees
//! - Single-pass performance metrics
//! - Full backtest replay and single-step evaluation for paper trading
//!
//! Nothing here touches the filesystem or the clock.

pub mod data;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod indicators;
pub mod interval;
pub mod metrics;
pub mod position_management;
pub mod result;
pub mod signals;
pub mod sizers;
pub mod strategy;

pub use data::{normalize_candles, CandleNormalizer};
pub use domain::{Candle, ClosedTrade, ExitReason, Position, PositionState};
pub use engine::{latest_signal, run_backtest, LatestSignal, PaperTickError, MIN_CANDLES};
pub use indicators::IndicatorSeries;
pub use metrics::{EquityCurve, MetricNote, PerformanceMetrics};
pub use position_management::{PositionManager, Transition};
pub use result::{BacktestFailure, BacktestResult};
pub use signals::{signal_at, Signal};
pub use strategy::{ConfigError, StrategyConfig, StrategyKind};
