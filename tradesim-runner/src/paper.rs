//! Paper trading: one incremental step per external tick.
//!
//! Each tick classifies only the latest candle, then runs the same position
//! state machine as the backtest for a single step against the persisted
//! state. Sizing uses current paper equity as the capital basis. The whole
//! load → step → save → log sequence holds the store's lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;

use tradesim_core::domain::{Candle, ClosedTrade, Position, PositionState};
use tradesim_core::position_management::round4;
use tradesim_core::{latest_signal, PaperTickError, PositionManager, Signal, StrategyConfig, Transition};

use crate::config::RunnerConfig;
use crate::history::{LogError, PaperEvent, PaperTradeLog};
use crate::store::{PaperStore, StoreError};

/// Persisted paper account: capital, equity and at most one open position
/// per symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperTradingState {
    pub starting_capital: f64,
    pub equity: f64,
    #[serde(default)]
    pub positions: BTreeMap<String, Position>,
    /// Positions opened so far; keeps derived position ids unique.
    #[serde(default)]
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

impl PaperTradingState {
    pub fn new(starting_capital: f64, now: DateTime<Utc>) -> Self {
        Self {
            starting_capital,
            equity: starting_capital,
            positions: BTreeMap::new(),
            sequence: 0,
            created_at: now,
            last_update: None,
        }
    }
}

/// Errors from a paper tick.
#[derive(Debug, Error)]
pub enum PaperError {
    #[error(transparent)]
    Tick(#[from] PaperTickError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Log(#[from] LogError),
}

impl PaperError {
    /// One-line rendering for operators.
    pub fn summary(&self) -> String {
        format!("Paper trade: {self}")
    }
}

/// Outcome of one paper tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperCycle {
    pub symbol: String,
    pub interval: String,
    pub signal: Signal,
    pub price: f64,
    pub opened: Option<Position>,
    pub closed: Option<ClosedTrade>,
    pub equity: f64,
    pub positions: BTreeMap<String, Position>,
}

impl PaperCycle {
    pub fn summary(&self) -> String {
        let mut out = format!(
            "PAPER TRADE: {} ({})\nSignal: {} | Price: {:.4}\nEquity: ${:.2}",
            self.symbol, self.interval, self.signal, self.price, self.equity
        );
        if let Some(t) = &self.closed {
            let _ = write!(
                out,
                "\nClosed {} @ {:.4} | PnL ${:+.2} ({})",
                t.position.side.as_str(),
                t.exit_price,
                t.pnl,
                t.exit_reason
            );
        }
        if let Some(p) = &self.opened {
            let _ = write!(
                out,
                "\nOpened {} @ {:.4} | Size {:.1}%",
                p.side.as_str(),
                p.entry_price,
                p.size_fraction * 100.0
            );
        }
        if self.closed.is_none() && self.opened.is_none() {
            out.push_str("\nNo position change");
        }
        out
    }
}

/// Runs paper ticks against one state document and one event log.
#[derive(Debug, Clone)]
pub struct PaperTrader {
    store: PaperStore,
    log: PaperTradeLog,
}

impl PaperTrader {
    pub fn new(store: PaperStore, log: PaperTradeLog) -> Self {
        Self { store, log }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.paper_store(), config.paper_trade_log())
    }

    pub fn store(&self) -> &PaperStore {
        &self.store
    }

    pub fn log(&self) -> &PaperTradeLog {
        &self.log
    }

    /// Evaluate the latest candle for `symbol` and apply at most one
    /// open or close to the persisted state.
    ///
    /// Events are appended before the state is saved. On `PaperError::Log`
    /// nothing was committed; on `PaperError::Store` after a transition the
    /// log may hold an event whose state change was not saved.
    pub fn tick(
        &self,
        candles: &[Candle],
        symbol: &str,
        interval: &str,
        strategy: &StrategyConfig,
        now: DateTime<Utc>,
    ) -> Result<PaperCycle, PaperError> {
        let latest = latest_signal(candles, strategy)?;

        let lock = self.store.lock()?;
        let mut state = self.store.load(&lock, strategy.starting_capital, now)?;

        let current: PositionState = state.positions.remove(symbol).into();
        let mut manager = PositionManager::with_state(symbol, strategy, current, state.sequence);
        let transition = manager.step(latest.signal, latest.price, latest.timestamp, state.equity);
        let (position, sequence) = manager.into_parts();

        state.sequence = sequence;
        if let PositionState::Open(p) = position {
            state.positions.insert(symbol.to_string(), p);
        }

        let (opened, closed) = match transition {
            Transition::Opened(p) => (Some(p), None),
            Transition::Closed(t) => {
                state.equity = round4(state.equity + t.pnl);
                (None, Some(t))
            }
            Transition::None => (None, None),
        };
        state.last_update = Some(now);

        // Log first; a failed append leaves the persisted state untouched.
        let logged_at = now.timestamp();
        if let Some(trade) = &closed {
            self.log.append(&PaperEvent::Close {
                logged_at,
                trade: trade.clone(),
            })?;
        }
        if let Some(position) = &opened {
            self.log.append(&PaperEvent::Open {
                logged_at,
                position: position.clone(),
            })?;
        }
        self.store.save(&lock, &state)?;

        if let Some(trade) = &closed {
            tracing::info!(
                symbol,
                reason = %trade.exit_reason,
                pnl = trade.pnl,
                equity = state.equity,
                "paper position closed"
            );
        }
        if let Some(position) = &opened {
            tracing::info!(
                symbol,
                entry = position.entry_price,
                notional = position.notional,
                "paper position opened"
            );
        }

        Ok(PaperCycle {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            signal: latest.signal,
            price: latest.price,
            opened,
            closed,
            equity: state.equity,
            positions: state.positions,
        })
    }
}
