//! Position manager: opens, sizes and closes one long position per symbol.
//!
//! **Key invariants:**
//! - At most one open position; Enter while open is ignored
//! - At most one transition per step (a close is never followed by a
//!   re-entry on the same candle)
//! - Exit checks run in fixed priority: stop-loss, take-profit, signal
//! - Fees and slippage apply only to realized trades, never to mark-to-market

use crate::domain::{ClosedTrade, ExitReason, Position, PositionId, PositionSide, PositionState};
use crate::execution::CostModel;
use crate::signals::Signal;
use crate::sizers::FixedFractionalSizer;
use crate::strategy::StrategyConfig;

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    None,
    Opened(Position),
    Closed(ClosedTrade),
}

impl Transition {
    pub fn opened(&self) -> Option<&Position> {
        match self {
            Transition::Opened(p) => Some(p),
            _ => None,
        }
    }

    pub fn closed(&self) -> Option<&ClosedTrade> {
        match self {
            Transition::Closed(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionManager {
    symbol: String,
    strategy: String,
    sizer: FixedFractionalSizer,
    costs: CostModel,
    stop_loss_fraction: f64,
    take_profit_fraction: f64,
    state: PositionState,
    /// Positions opened so far; part of each position id.
    sequence: u64,
}

impl PositionManager {
    /// A flat manager for `symbol`.
    pub fn new(symbol: impl Into<String>, config: &StrategyConfig) -> Self {
        Self::with_state(symbol, config, PositionState::Flat, 0)
    }

    /// Resume from a persisted state and open-count.
    pub fn with_state(
        symbol: impl Into<String>,
        config: &StrategyConfig,
        state: PositionState,
        sequence: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            strategy: config.kind.as_str().to_string(),
            sizer: FixedFractionalSizer::from_config(config),
            costs: CostModel::from_config(config),
            stop_loss_fraction: config.stop_loss_fraction,
            take_profit_fraction: config.take_profit_fraction,
            state,
            sequence,
        }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn into_parts(self) -> (PositionState, u64) {
        (self.state, self.sequence)
    }

    /// Apply one signal at one price.
    ///
    /// `capital` is the basis for sizing a new position (starting capital in a
    /// backtest, current equity in paper trading).
    pub fn step(
        &mut self,
        signal: Signal,
        price: f64,
        timestamp: Option<i64>,
        capital: f64,
    ) -> Transition {
        match std::mem::take(&mut self.state) {
            PositionState::Open(position) => match exit_reason(&position, price, signal) {
                Some(reason) => Transition::Closed(self.settle(position, price, timestamp, reason)),
                None => {
                    self.state = PositionState::Open(position);
                    Transition::None
                }
            },
            PositionState::Flat if signal == Signal::Enter => {
                let position = self.open(price, timestamp, capital);
                self.state = PositionState::Open(position.clone());
                Transition::Opened(position)
            }
            PositionState::Flat => Transition::None,
        }
    }

    /// Settle any open position at `price` with reason `Final`.
    pub fn force_close(&mut self, price: f64, timestamp: Option<i64>) -> Option<ClosedTrade> {
        match std::mem::take(&mut self.state) {
            PositionState::Open(position) => {
                Some(self.settle(position, price, timestamp, ExitReason::Final))
            }
            PositionState::Flat => None,
        }
    }

    /// Mark-to-market P&L of the open position (0 when flat).
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.state
            .position()
            .map_or(0.0, |p| p.unrealized_pnl(price))
    }

    fn open(&mut self, price: f64, timestamp: Option<i64>, capital: f64) -> Position {
        let size_fraction = self.sizer.size_fraction();
        let entry_price = self.costs.entry_price(price);
        let id = PositionId::derive(&self.symbol, &self.strategy, timestamp, self.sequence);
        self.sequence += 1;

        Position {
            id,
            symbol: self.symbol.clone(),
            side: PositionSide::Long,
            entry_price,
            size_fraction,
            notional: capital * size_fraction,
            stop_loss: entry_price * (1.0 - self.stop_loss_fraction),
            take_profit: entry_price * (1.0 + self.take_profit_fraction),
            opened_at: timestamp,
            strategy: self.strategy.clone(),
        }
    }

    fn settle(
        &self,
        position: Position,
        price: f64,
        timestamp: Option<i64>,
        reason: ExitReason,
    ) -> ClosedTrade {
        let exit_price = self.costs.exit_price(price);
        let gross = if position.entry_price > 0.0 {
            (exit_price - position.entry_price) / position.entry_price * position.notional
        } else {
            0.0
        };
        let pnl = gross - self.costs.round_trip_fee(position.notional);
        let pnl_fraction = if position.notional != 0.0 {
            pnl / position.notional
        } else {
            0.0
        };

        ClosedTrade {
            position,
            exit_price,
            closed_at: timestamp,
            exit_reason: reason,
            pnl: round4(pnl),
            pnl_fraction,
        }
    }
}

/// Exit reason for `position` at `price`, in priority order:
/// stop-loss, take-profit, then an Exit signal.
pub fn exit_reason(position: &Position, price: f64, signal: Signal) -> Option<ExitReason> {
    if price <= position.stop_loss {
        Some(ExitReason::StopLoss)
    } else if price >= position.take_profit {
        Some(ExitReason::TakeProfit)
    } else if signal == Signal::Exit {
        Some(ExitReason::Signal)
    } else {
        None
    }
}

/// Round to 4 decimal places.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
