//! Candle-by-candle replay: the heart of the backtesting engine.
//!
//! Per candle after warmup:
//! 1. Classify the indicator values into a signal
//! 2. Step the position manager (exit checks before entry)
//! 3. Append mark-to-market equity, folding peak and drawdown inline
//!
//! After the last candle any open position is force-closed at the last close.
//! Realized equity then replaces the final curve point without touching the
//! drawdown already recorded.

use crate::domain::{closes, Candle, ClosedTrade};
use crate::indicators::IndicatorSeries;
use crate::metrics::{EquityCurve, PerformanceMetrics};
use crate::position_management::{PositionManager, Transition};
use crate::result::{BacktestFailure, BacktestResult};
use crate::signals::signal_at;
use crate::strategy::StrategyConfig;

/// Fewer candles than this yields an `InsufficientData` result.
pub const MIN_CANDLES: usize = 20;

/// Run a backtest over normalized candles.
///
/// Never fails: insufficient data is reported in `BacktestResult::error`.
pub fn run_backtest(
    candles: &[Candle],
    symbol: &str,
    interval: &str,
    config: &StrategyConfig,
) -> BacktestResult {
    let period = (
        candles.first().and_then(|c| c.timestamp),
        candles.last().and_then(|c| c.timestamp),
    );

    if candles.len() < MIN_CANDLES {
        tracing::debug!(
            symbol,
            candles = candles.len(),
            required = MIN_CANDLES,
            "not enough candles for backtest"
        );
        let failure = BacktestFailure::InsufficientData {
            candles: candles.len(),
            required: MIN_CANDLES,
        };
        return BacktestResult::failed(symbol, interval, config, period, failure);
    }

    // Step 1: Precompute indicators
    let prices = closes(candles);
    let series = IndicatorSeries::build(&prices, config);
    let warmup = series.warmup();

    // Step 2: Replay
    let capital = config.starting_capital;
    let mut equity = capital;
    let mut curve = EquityCurve::with_capacity(capital, prices.len());
    let mut manager = PositionManager::new(symbol, config);
    let mut trades: Vec<ClosedTrade> = Vec::new();

    for (idx, (&price, candle)) in prices.iter().zip(candles).enumerate() {
        if idx < warmup {
            curve.push(equity);
            continue;
        }

        let signal = signal_at(&series, idx);
        if let Transition::Closed(trade) = manager.step(signal, price, candle.timestamp, capital) {
            equity += trade.pnl;
            trades.push(trade);
        }

        curve.push(equity + manager.unrealized_pnl(price));
    }

    // Step 3: Settle whatever is still open
    if let Some(last) = candles.last() {
        if let Some(trade) = manager.force_close(last.close, last.timestamp) {
            equity += trade.pnl;
            trades.push(trade);
            curve.replace_last(equity);
        }
    }

    // Step 4: Metrics
    let metrics = PerformanceMetrics::compute(&trades, &curve, capital, interval);
    tracing::debug!(
        symbol,
        strategy = %config.kind,
        trades = metrics.total_trades,
        net_pnl = metrics.net_pnl,
        "backtest complete"
    );
    BacktestResult::completed(symbol, interval, config, period, metrics, trades)
}
