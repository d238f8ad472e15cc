//! Append-only JSONL logs: backtest results and paper-trade events.
//!
//! One JSON object per line, so the files survive partial writes and can be
//! streamed. Readers skip blank and malformed lines rather than failing.
//! Every entry carries `logged_at` (unix seconds) for age filtering.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use tradesim_core::domain::{ClosedTrade, Position};
use tradesim_core::{BacktestFailure, BacktestResult, MetricNote, StrategyKind};

const SECONDS_PER_DAY: i64 = 86_400;

/// Errors from reading or appending a log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize log entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ─── JSONL plumbing ─────────────────────────────────────────────────

fn append_line<T: Serialize>(path: &Path, entry: &T) -> Result<(), LogError> {
    let json = serde_json::to_string(entry)?;
    let io_err = |source| LogError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    writeln!(file, "{json}").map_err(io_err)?;
    file.flush().map_err(io_err)?;
    Ok(())
}

fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LogError> {
    let io_err = |source| LogError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(e)),
    };

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for line in io::BufReader::new(file).lines() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(entry) => entries.push(entry),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(path = %path.display(), skipped, "skipped malformed log lines");
    }
    Ok(entries)
}

/// Age and symbol filter shared by both logs.
#[derive(Debug, Clone, Copy)]
struct Filter<'a> {
    cutoff: Option<i64>,
    symbol: Option<&'a str>,
}

impl<'a> Filter<'a> {
    /// `days == 0` disables the age cutoff.
    fn new(days: u32, symbol: Option<&'a str>, now: DateTime<Utc>) -> Self {
        let cutoff = (days > 0).then(|| now.timestamp() - i64::from(days) * SECONDS_PER_DAY);
        Self { cutoff, symbol }
    }

    fn keeps(&self, logged_at: i64, symbol: &str) -> bool {
        if self.cutoff.is_some_and(|cutoff| logged_at < cutoff) {
            return false;
        }
        self.symbol
            .map_or(true, |wanted| wanted.eq_ignore_ascii_case(symbol))
    }
}

/// First element with the largest key (earlier entries win ties).
fn first_max_by<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<&T> {
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let k = key(item);
        match best {
            Some((_, b)) if k.total_cmp(&b).is_le() => {}
            _ => best = Some((item, k)),
        }
    }
    best.map(|(item, _)| item)
}

// ─── Backtest results ───────────────────────────────────────────────

/// Flat log row for one backtest: every scalar of the result, no trade list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRecord {
    pub logged_at: i64,
    pub symbol: String,
    pub interval: String,
    pub strategy: StrategyKind,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    pub period_start: Option<i64>,
    pub period_end: Option<i64>,
    pub total_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub expectancy: f64,
    pub net_pnl: f64,
    pub roi: f64,
    pub equity_start: f64,
    pub equity_end: f64,
    #[serde(default)]
    pub notes: Vec<MetricNote>,
    #[serde(default)]
    pub error: Option<BacktestFailure>,
}

impl BacktestRecord {
    pub fn from_result(result: &BacktestResult, logged_at: i64) -> Self {
        Self {
            logged_at,
            symbol: result.symbol.clone(),
            interval: result.interval.clone(),
            strategy: result.strategy.clone(),
            params: result.params.clone(),
            period_start: result.period_start,
            period_end: result.period_end,
            total_trades: result.total_trades,
            win_rate: result.win_rate,
            profit_factor: result.profit_factor,
            max_drawdown: result.max_drawdown,
            sharpe_ratio: result.sharpe_ratio,
            expectancy: result.expectancy,
            net_pnl: result.net_pnl,
            roi: result.roi,
            equity_start: result.equity_start,
            equity_end: result.equity_end,
            notes: result.notes.clone(),
            error: result.error,
        }
    }
}

/// Recent-backtest overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub count: usize,
    pub best_sharpe: Option<BacktestRecord>,
    pub best_roi: Option<BacktestRecord>,
    pub latest: Option<BacktestRecord>,
}

impl BacktestSummary {
    pub fn render(&self) -> String {
        let mut lines = vec![format!("Backtests: {}", self.count)];
        if let Some(r) = &self.best_sharpe {
            lines.push(format!(
                "Best Sharpe: {} ({}) {} {:.2}",
                r.symbol, r.interval, r.strategy, r.sharpe_ratio
            ));
        }
        if let Some(r) = &self.best_roi {
            lines.push(format!(
                "Best ROI: {} ({}) {} {:.2}%",
                r.symbol,
                r.interval,
                r.strategy,
                r.roi * 100.0
            ));
        }
        if let Some(r) = &self.latest {
            lines.push(format!(
                "Latest: {} ({}) {} | Trades: {} | Net PnL: ${:+.2}",
                r.symbol, r.interval, r.strategy, r.total_trades, r.net_pnl
            ));
        }
        lines.join("\n")
    }
}

/// `backtests.jsonl`
#[derive(Debug, Clone)]
pub struct BacktestLog {
    path: PathBuf,
}

impl BacktestLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row for `result`, stamped `now`.
    pub fn append(&self, result: &BacktestResult, now: DateTime<Utc>) -> Result<(), LogError> {
        append_line(&self.path, &BacktestRecord::from_result(result, now.timestamp()))
    }

    /// Rows from the last `days` days (0 = all), optionally for one symbol
    /// (case-insensitive), in file order.
    pub fn load(
        &self,
        days: u32,
        symbol: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<BacktestRecord>, LogError> {
        let filter = Filter::new(days, symbol, now);
        Ok(read_lines::<BacktestRecord>(&self.path)?
            .into_iter()
            .filter(|r| filter.keeps(r.logged_at, &r.symbol))
            .collect())
    }

    pub fn summarize(
        &self,
        days: u32,
        symbol: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<BacktestSummary, LogError> {
        let records = self.load(days, symbol, now)?;
        Ok(BacktestSummary {
            count: records.len(),
            best_sharpe: first_max_by(&records, |r| r.sharpe_ratio).cloned(),
            best_roi: first_max_by(&records, |r| r.roi).cloned(),
            latest: first_max_by(&records, |r| r.logged_at as f64).cloned(),
        })
    }
}

// ─── Paper-trade events ─────────────────────────────────────────────

/// One paper-trading event, tagged `"event": "open" | "close"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum PaperEvent {
    Open { logged_at: i64, position: Position },
    Close { logged_at: i64, trade: ClosedTrade },
}

impl PaperEvent {
    pub fn logged_at(&self) -> i64 {
        match self {
            PaperEvent::Open { logged_at, .. } | PaperEvent::Close { logged_at, .. } => *logged_at,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            PaperEvent::Open { position, .. } => &position.symbol,
            PaperEvent::Close { trade, .. } => trade.symbol(),
        }
    }
}

/// Closed paper-trade overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub total_trades: usize,
    pub win_rate: f64,
    pub net_pnl: f64,
    /// Net P&L over the paper account's starting capital.
    pub roi: f64,
    pub first_trade_at: Option<i64>,
    pub last_trade_at: Option<i64>,
}

impl PaperSummary {
    pub fn render(&self) -> String {
        format!(
            "Paper trades: {} | Win rate: {:.1}%\nNet PnL: ${:+.2} | ROI: {:.2}%",
            self.total_trades,
            self.win_rate * 100.0,
            self.net_pnl,
            self.roi * 100.0
        )
    }
}

/// `paper_trades.jsonl`
#[derive(Debug, Clone)]
pub struct PaperTradeLog {
    path: PathBuf,
}

impl PaperTradeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &PaperEvent) -> Result<(), LogError> {
        append_line(&self.path, event)
    }

    pub fn load(
        &self,
        days: u32,
        symbol: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<PaperEvent>, LogError> {
        let filter = Filter::new(days, symbol, now);
        Ok(read_lines::<PaperEvent>(&self.path)?
            .into_iter()
            .filter(|e| filter.keeps(e.logged_at(), e.symbol()))
            .collect())
    }

    /// Summarize close events. ROI is relative to `starting_capital`
    /// (0 when it is 0).
    pub fn summarize(
        &self,
        days: u32,
        symbol: Option<&str>,
        starting_capital: f64,
        now: DateTime<Utc>,
    ) -> Result<PaperSummary, LogError> {
        let mut total = 0usize;
        let mut wins = 0usize;
        let mut net_pnl = 0.0;
        let mut first: Option<i64> = None;
        let mut last: Option<i64> = None;

        for event in self.load(days, symbol, now)? {
            let PaperEvent::Close { logged_at, trade } = event else {
                continue;
            };
            total += 1;
            if trade.is_winner() {
                wins += 1;
            }
            net_pnl += trade.pnl;
            first = Some(first.map_or(logged_at, |f| f.min(logged_at)));
            last = Some(last.map_or(logged_at, |l| l.max(logged_at)));
        }

        Ok(PaperSummary {
            total_trades: total,
            win_rate: if total > 0 { wins as f64 / total as f64 } else { 0.0 },
            net_pnl,
            roi: if starting_capital != 0.0 { net_pnl / starting_capital } else { 0.0 },
            first_trade_at: first,
            last_trade_at: last,
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
