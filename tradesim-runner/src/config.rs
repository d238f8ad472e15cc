//! Runner configuration: where state and logs live, and what to run.
//!
//! Replaces every process-wide path and default with one explicit value that
//! the CLI (or any other caller) loads and passes down.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tradesim_core::StrategyConfig;

use crate::history::{BacktestLog, PaperTradeLog};
use crate::store::PaperStore;

pub const PAPER_STATE_FILE: &str = "paper_state.json";
pub const PAPER_TRADES_FILE: &str = "paper_trades.jsonl";
pub const BACKTESTS_FILE: &str = "backtests.jsonl";

/// Errors from loading or validating a runner configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid strategy: {0}")]
    Strategy(#[from] tradesim_core::ConfigError),
}

/// Serializable runner configuration.
///
/// ```toml
/// data_dir = "data/trader"
/// interval = "1h"
///
/// [strategy]
/// kind = "sma_cross"
/// starting_capital = 1000.0
///
/// [strategy.params]
/// fast = 5.0
/// slow = 20.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Directory holding the paper state document and both logs.
    pub data_dir: PathBuf,
    /// Default candle interval label (e.g. "1h", "15m", "1d").
    pub interval: String,
    pub strategy: StrategyConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/trader"),
            interval: "1h".to_string(),
            strategy: StrategyConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.strategy.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Runner config rooted at `data_dir` with defaults elsewhere.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn paper_state_path(&self) -> PathBuf {
        self.data_dir.join(PAPER_STATE_FILE)
    }

    pub fn paper_trades_path(&self) -> PathBuf {
        self.data_dir.join(PAPER_TRADES_FILE)
    }

    pub fn backtests_path(&self) -> PathBuf {
        self.data_dir.join(BACKTESTS_FILE)
    }

    pub fn paper_store(&self) -> PaperStore {
        PaperStore::new(self.paper_state_path())
    }

    pub fn paper_trade_log(&self) -> PaperTradeLog {
        PaperTradeLog::new(self.paper_trades_path())
    }

    pub fn backtest_log(&self) -> BacktestLog {
        BacktestLog::new(self.backtests_path())
    }
}
