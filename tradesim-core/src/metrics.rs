//! Performance metrics: one pass over the closed trades and one over the
//! equity curve.
//!
//! Undefined ratios (no trades, no losing trades, flat equity) are reported as
//! 0.0 for compatibility with existing logs, with a `MetricNote` recording why
//! so a true zero stays distinguishable from a substituted one.

use serde::{Deserialize, Serialize};

use crate::domain::ClosedTrade;
use crate::interval::annualization_factor;

/// Why a metric holds a substituted value rather than a computed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricNote {
    /// Win rate and expectancy are 0 because nothing traded.
    NoTrades,
    /// Gross loss is 0; profit factor is gross profit (or 0) instead of a ratio.
    NoLosingTrades,
    /// Fewer than two equity returns; Sharpe is 0.
    SharpeInsufficientReturns,
    /// Returns have zero variance; Sharpe is 0.
    SharpeZeroVariance,
    /// Starting equity is 0; ROI is 0.
    ZeroStartingEquity,
}

/// Mark-to-market equity, one value per candle, with running peak and
/// maximum drawdown folded in as values are appended.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityCurve {
    values: Vec<f64>,
    peak: f64,
    max_drawdown: f64,
}

impl EquityCurve {
    /// Empty curve whose peak starts at `starting_equity`.
    pub fn new(starting_equity: f64) -> Self {
        Self {
            values: Vec::new(),
            peak: starting_equity,
            max_drawdown: 0.0,
        }
    }

    pub fn with_capacity(starting_equity: f64, capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            ..Self::new(starting_equity)
        }
    }

    pub fn push(&mut self, equity: f64) {
        self.values.push(equity);
        self.observe(equity);
    }

    /// Overwrite the last point (e.g. with realized equity after a final
    /// settlement). Pushes when the curve is empty.
    ///
    /// Peak and drawdown track marked-to-market points only; the replaced
    /// value is not observed.
    pub fn replace_last(&mut self, equity: f64) {
        match self.values.last_mut() {
            Some(last) => *last = equity,
            None => self.values.push(equity),
        }
    }

    fn observe(&mut self, equity: f64) {
        self.peak = self.peak.max(equity);
        if self.peak > 0.0 {
            let dd = (self.peak - equity) / self.peak;
            self.max_drawdown = self.max_drawdown.max(dd);
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest `(peak - equity) / peak` seen so far.
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }
}

/// Aggregate statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub net_pnl: f64,
    pub roi: f64,
    pub equity_end: f64,
    pub notes: Vec<MetricNote>,
}

impl PerformanceMetrics {
    pub fn compute(
        trades: &[ClosedTrade],
        curve: &EquityCurve,
        starting_equity: f64,
        interval: &str,
    ) -> Self {
        let mut notes = Vec::new();
        let stats = TradeStats::from_trades(trades);

        let total_trades = trades.len();
        if total_trades == 0 {
            notes.push(MetricNote::NoTrades);
        }
        let win_rate = if total_trades > 0 {
            stats.wins as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if stats.gross_loss > 0.0 {
            stats.gross_profit / stats.gross_loss
        } else {
            if total_trades > 0 {
                notes.push(MetricNote::NoLosingTrades);
            }
            if stats.gross_profit > 0.0 {
                stats.gross_profit
            } else {
                0.0
            }
        };

        let avg_win = mean_or_zero(stats.gross_profit, stats.wins);
        let avg_loss = mean_or_zero(stats.gross_loss, stats.losses);
        let expectancy = win_rate * avg_win - (1.0 - win_rate) * avg_loss;

        let equity_end = curve.last().unwrap_or(starting_equity);
        let net_pnl = equity_end - starting_equity;
        let roi = if starting_equity != 0.0 {
            net_pnl / starting_equity
        } else {
            notes.push(MetricNote::ZeroStartingEquity);
            0.0
        };

        let sharpe_ratio = match sharpe_ratio(curve.values(), interval) {
            Ok(sharpe) => sharpe,
            Err(note) => {
                notes.push(note);
                0.0
            }
        };

        Self {
            total_trades,
            win_rate,
            profit_factor,
            expectancy,
            max_drawdown: curve.max_drawdown(),
            sharpe_ratio,
            net_pnl,
            roi,
            equity_end,
            notes,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

#[derive(Debug, Default)]
struct TradeStats {
    wins: usize,
    losses: usize,
    gross_profit: f64,
    /// Magnitude of summed losing P&L.
    gross_loss: f64,
}

impl TradeStats {
    fn from_trades(trades: &[ClosedTrade]) -> Self {
        let mut stats = Self::default();
        for trade in trades {
            if trade.is_winner() {
                stats.wins += 1;
                stats.gross_profit += trade.pnl;
            } else if trade.is_loser() {
                stats.losses += 1;
                stats.gross_loss += -trade.pnl;
            }
        }
        stats
    }
}

fn mean_or_zero(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Annualized Sharpe ratio of per-step equity returns.
///
/// Returns are `cur / prev - 1`, skipping steps whose previous equity is 0.
/// Mean and population standard deviation come from a single Welford pass.
/// Errors with the reason when the ratio is undefined.
pub fn sharpe_ratio(equity: &[f64], interval: &str) -> Result<f64, MetricNote> {
    let mut n = 0usize;
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for pair in equity.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        if prev == 0.0 {
            continue;
        }
        let r = cur / prev - 1.0;
        n += 1;
        let delta = r - mean;
        mean += delta / n as f64;
        m2 += delta * (r - mean);
    }

    if n < 2 {
        return Err(MetricNote::SharpeInsufficientReturns);
    }
    let std = (m2 / n as f64).sqrt();
    if std == 0.0 {
        return Err(MetricNote::SharpeZeroVariance);
    }
    Ok(mean / std * annualization_factor(interval).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitReason, Position, PositionId, PositionSide};

    fn trade(pnl: f64) -> ClosedTrade {
        ClosedTrade {
            position: Position {
                id: PositionId("abc".into()),
                symbol: "BTC".into(),
                side: PositionSide::Long,
                entry_price: 100.0,
                size_fraction: 0.25,
                notional: 250.0,
                stop_loss: 97.0,
                take_profit: 106.0,
                opened_at: Some(0),
                strategy: "sma_cross".into(),
            },
            exit_price: 100.0,
            closed_at: Some(1),
            exit_reason: ExitReason::Signal,
            pnl,
            pnl_fraction: pnl / 250.0,
        }
    }

    fn curve(values: &[f64]) -> EquityCurve {
        let mut c = EquityCurve::new(values.first().copied().unwrap_or(0.0));
        for &v in values {
            c.push(v);
        }
        c
    }

    #[test]
    fn drawdown_tracks_running_peak() {
        let c = curve(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        assert!((c.max_drawdown() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn replace_last_leaves_drawdown_untouched() {
        let mut c = curve(&[100.0, 90.0]);
        c.replace_last(80.0);
        assert_eq!(c.values(), &[100.0, 80.0]);
        assert!((c.max_drawdown() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn non_positive_peak_has_no_drawdown() {
        let c = curve(&[0.0, -5.0]);
        assert_eq!(c.max_drawdown(), 0.0);
    }

    #[test]
    fn mixed_trades() {
        let trades = [trade(10.0), trade(-5.0), trade(20.0), trade(-5.0)];
        let m = PerformanceMetrics::compute(&trades, &curve(&[1000.0, 1020.0]), 1000.0, "1d");
        assert_eq!(m.total_trades, 4);
        assert_eq!(m.win_rate, 0.5);
        assert_eq!(m.profit_factor, 3.0);
        // 0.5 * 15 - 0.5 * 5
        assert!((m.expectancy - 5.0).abs() < 1e-12);
        assert!((m.net_pnl - 20.0).abs() < 1e-12);
        assert!((m.roi - 0.02).abs() < 1e-12);
    }

    #[test]
    fn single_loss_has_zero_profit_factor() {
        let m = PerformanceMetrics::compute(&[trade(-3.0)], &curve(&[1000.0, 997.0]), 1000.0, "1h");
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m.win_rate, 0.0);
        assert!((m.expectancy + 3.0).abs() < 1e-12);
        assert!(!m.notes.contains(&MetricNote::NoLosingTrades));
    }

    #[test]
    fn only_winners_use_gross_profit() {
        let m = PerformanceMetrics::compute(&[trade(4.0), trade(6.0)], &curve(&[1000.0]), 1000.0, "1h");
        assert_eq!(m.profit_factor, 10.0);
        assert!(m.notes.contains(&MetricNote::NoLosingTrades));
    }

    #[test]
    fn no_trades_is_noted() {
        let m = PerformanceMetrics::compute(&[], &curve(&[1000.0, 1000.0]), 1000.0, "1h");
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.profit_factor, 0.0);
        assert!(m.notes.contains(&MetricNote::NoTrades));
        assert!(m.notes.contains(&MetricNote::SharpeInsufficientReturns));
    }

    #[test]
    fn zero_starting_equity_roi() {
        let m = PerformanceMetrics::compute(&[], &curve(&[0.0, 0.0, 0.0]), 0.0, "1h");
        assert_eq!(m.roi, 0.0);
        assert!(m.notes.contains(&MetricNote::ZeroStartingEquity));
        assert_eq!(m.sharpe_ratio, 0.0);
    }

    #[test]
    fn empty_curve_ends_at_start() {
        let m = PerformanceMetrics::compute(&[], &EquityCurve::new(500.0), 500.0, "1h");
        assert_eq!(m.equity_end, 500.0);
        assert_eq!(m.net_pnl, 0.0);
    }

    #[test]
    fn sharpe_flat_equity_is_zero_variance() {
        assert_eq!(
            sharpe_ratio(&[100.0, 100.0, 100.0], "1d"),
            Err(MetricNote::SharpeZeroVariance)
        );
    }

    #[test]
    fn sharpe_matches_population_formula() {
        let equity = [100.0, 110.0, 99.0, 108.9];
        let returns = [0.1, -0.1, 0.1];
        let mean = returns.iter().sum::<f64>() / 3.0;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 3.0;
        let expected = mean / var.sqrt() * 365.0_f64.sqrt();
        let got = sharpe_ratio(&equity, "1d").unwrap();
        assert!((got - expected).abs() < 1e-9, "got {got}, expected {expected}");
    }

    #[test]
    fn sharpe_skips_zero_previous_equity() {
        assert_eq!(
            sharpe_ratio(&[0.0, 100.0, 110.0], "1d"),
            Err(MetricNote::SharpeInsufficientReturns)
        );
    }
}
