//! Backtest result: one immutable record per run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::ClosedTrade;
use crate::metrics::{MetricNote, PerformanceMetrics};
use crate::strategy::{StrategyConfig, StrategyKind};

/// Why a backtest produced no statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BacktestFailure {
    InsufficientData { candles: usize, required: usize },
}

impl fmt::Display for BacktestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacktestFailure::InsufficientData { .. } => f.write_str("Not enough data for backtest"),
        }
    }
}

/// Complete result of a backtest run.
///
/// Contains:
/// - Run identity (symbol, interval, strategy kind and parameters)
/// - Data period bounds
/// - Performance statistics
/// - Ordered closed-trade ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub interval: String,
    pub strategy: StrategyKind,
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

    pub trades: Vec<ClosedTrade>,
    /// Metrics that hold substituted zeros, and why.
    #[serde(default)]
    pub notes: Vec<MetricNote>,
    #[serde(default)]
    pub error: Option<BacktestFailure>,
}

impl BacktestResult {
    pub(crate) fn completed(
        symbol: &str,
        interval: &str,
        config: &StrategyConfig,
        period: (Option<i64>, Option<i64>),
        metrics: PerformanceMetrics,
        trades: Vec<ClosedTrade>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            strategy: config.kind.clone(),
            params: config.params.clone(),
            period_start: period.0,
            period_end: period.1,
            total_trades: metrics.total_trades,
            win_rate: metrics.win_rate,
            profit_factor: metrics.profit_factor,
            max_drawdown: metrics.max_drawdown,
            sharpe_ratio: metrics.sharpe_ratio,
            expectancy: metrics.expectancy,
            net_pnl: metrics.net_pnl,
            roi: metrics.roi,
            equity_start: config.starting_capital,
            equity_end: metrics.equity_end,
            trades,
            notes: metrics.notes,
            error: None,
        }
    }

    /// Zeroed result carrying only the failure reason.
    pub(crate) fn failed(
        symbol: &str,
        interval: &str,
        config: &StrategyConfig,
        period: (Option<i64>, Option<i64>),
        failure: BacktestFailure,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            strategy: config.kind.clone(),
            params: config.params.clone(),
            period_start: period.0,
            period_end: period.1,
            total_trades: 0,
            win_rate: 0.0,
            profit_factor: 0.0,
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
            expectancy: 0.0,
            net_pnl: 0.0,
            roi: 0.0,
            equity_start: config.starting_capital,
            equity_end: config.starting_capital,
            trades: Vec::new(),
            notes: Vec::new(),
            error: Some(failure),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Human-readable summary.
    pub fn summary(&self) -> String {
        if let Some(err) = &self.error {
            return format!("Backtest failed: {err}");
        }
        format!(
            "BACKTEST: {} ({}) {}\n\
             Trades: {} | Win rate: {:.1}%\n\
             Profit factor: {:.2} | Max DD: {:.1}%\n\
             Sharpe: {:.2} | Expectancy: ${:.2}\n\
             Net PnL: ${:+.2} | ROI: {:.2}%\n",
            self.symbol,
            self.interval,
            self.strategy,
            self.total_trades,
            self.win_rate * 100.0,
            self.profit_factor,
            self.max_drawdown * 100.0,
            self.sharpe_ratio,
            self.expectancy,
            self.net_pnl,
            self.roi * 100.0,
        )
    }
}
