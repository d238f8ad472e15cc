//! Tradesim Runner: the impure shell around `tradesim-core`.
//!
//! This crate provides:
//! - Snapshot loading and CSV trade export
//! - Paper trading state with a locked, atomically-saved store
//! - Append-only JSONL logs for backtests and paper events, with summaries
//! - Parallel parameter sweeps
//! - TOML runner configuration

pub mod config;
pub mod data_loader;
pub mod export;
pub mod history;
pub mod paper;
pub mod store;
pub mod sweep;

pub use config::{ConfigError, RunnerConfig};
pub use data_loader::{load_snapshot, parse_snapshot, LoadError};
pub use export::{export_trades_csv, ExportError};
pub use history::{
    BacktestLog, BacktestRecord, BacktestSummary, LogError, PaperEvent, PaperSummary,
    PaperTradeLog,
};
pub use paper::{PaperCycle, PaperError, PaperTrader, PaperTradingState};
pub use store::{LockOwner, PaperStore, StateLock, StoreError, DEFAULT_STALE_LOCK_SECS};
pub use sweep::{run_sweep, ParamGrid, SweepEntry, SweepResults};
