//! Parameter sweep: grid search over indicator parameters.
//!
//! Every configuration runs an independent, pure backtest over the same
//! candles, so the grid is evaluated in parallel with rayon. Output order is
//! grid order regardless of scheduling.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use tradesim_core::domain::Candle;
use tradesim_core::{run_backtest, BacktestResult, StrategyConfig, StrategyKind};

/// Parameter grid to sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamGrid {
    /// Moving-average cross: fast × slow windows.
    SmaCross { fast: Vec<usize>, slow: Vec<usize> },
    /// RSI reversion: period × lower × upper thresholds.
    Rsi {
        periods: Vec<usize>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    },
}

impl ParamGrid {
    /// Fast 3/5/8/10 × slow 15/20/30/50.
    pub fn sma_cross_default() -> Self {
        ParamGrid::SmaCross {
            fast: vec![3, 5, 8, 10],
            slow: vec![15, 20, 30, 50],
        }
    }

    /// Period 7/14/21 × lower 25/30 × upper 70/75.
    pub fn rsi_default() -> Self {
        ParamGrid::Rsi {
            periods: vec![7, 14, 21],
            lower: vec![25.0, 30.0],
            upper: vec![70.0, 75.0],
        }
    }

    /// Default grid for a strategy kind (unknown kinds sweep the SMA grid).
    pub fn default_for(kind: &StrategyKind) -> Self {
        match kind {
            StrategyKind::Rsi => Self::rsi_default(),
            _ => Self::sma_cross_default(),
        }
    }

    /// Generates all valid configurations, in grid order.
    ///
    /// Combinations with fast ≥ slow or lower ≥ upper are skipped.
    /// Costs, risk settings and capital come from `base`.
    pub fn generate_configs(&self, base: &StrategyConfig) -> Vec<StrategyConfig> {
        let mut configs = Vec::new();
        match self {
            ParamGrid::SmaCross { fast, slow } => {
                for &f in fast {
                    for &s in slow {
                        if f >= s {
                            continue;
                        }
                        configs.push(
                            StrategyConfig {
                                kind: StrategyKind::SmaCross,
                                params: Default::default(),
                                ..base.clone()
                            }
                            .with_param("fast", f as f64)
                            .with_param("slow", s as f64),
                        );
                    }
                }
            }
            ParamGrid::Rsi {
                periods,
                lower,
                upper,
            } => {
                for &p in periods {
                    for &lo in lower {
                        for &hi in upper {
                            if lo >= hi {
                                continue;
                            }
                            configs.push(
                                StrategyConfig {
                                    kind: StrategyKind::Rsi,
                                    params: Default::default(),
                                    ..base.clone()
                                }
                                .with_param("period", p as f64)
                                .with_param("lower", lo)
                                .with_param("upper", hi),
                            );
                        }
                    }
                }
            }
        }
        configs
    }
}

/// One evaluated grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    /// BLAKE3 fingerprint of `config`.
    pub config_hash: String,
    pub config: StrategyConfig,
    pub result: BacktestResult,
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResults {
    entries: Vec<SweepEntry>,
}

impl SweepResults {
    /// Returns all entries in grid order.
    pub fn all(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ranked by Sharpe, descending. Failed runs sort last; ties keep
    /// grid order.
    pub fn ranked(&self) -> Vec<&SweepEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| {
            b.result
                .is_ok()
                .cmp(&a.result.is_ok())
                .then(b.result.sharpe_ratio.total_cmp(&a.result.sharpe_ratio))
        });
        sorted
    }

    pub fn top_n(&self, n: usize) -> Vec<&SweepEntry> {
        self.ranked().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&SweepEntry> {
        self.ranked().into_iter().next()
    }
}

/// Backtest every configuration of `grid` over `candles` in parallel.
pub fn run_sweep(
    candles: &[Candle],
    symbol: &str,
    interval: &str,
    grid: &ParamGrid,
    base: &StrategyConfig,
) -> SweepResults {
    let configs = grid.generate_configs(base);
    tracing::info!(symbol, configs = configs.len(), "starting parameter sweep");

    let entries: Vec<SweepEntry> = configs
        .into_par_iter()
        .map(|config| {
            let result = run_backtest(candles, symbol, interval, &config);
            SweepEntry {
                config_hash: config.full_hash(),
                config,
                result,
            }
        })
        .collect();

    SweepResults { entries }
}
