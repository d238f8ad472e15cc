//! ClosedTrade: a completed round trip, entry to exit.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::position::Position;

/// Why a position was closed.
///
/// Risk exits are checked before signal exits; `Final` marks the forced
/// settlement at the end of a backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
    Final,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Signal => "signal",
            ExitReason::Final => "final",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed position with its realized result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub position: Position,
    /// Slippage-adjusted exit price.
    pub exit_price: f64,
    pub closed_at: Option<i64>,
    pub exit_reason: ExitReason,
    /// Realized P&L net of entry and exit fees, rounded to 4 decimals.
    pub pnl: f64,
    /// P&L as a fraction of notional (0 when notional is 0).
    pub pnl_fraction: f64,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pnl < 0.0
    }

    pub fn symbol(&self) -> &str {
        &self.position.symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PositionId, PositionSide};

    fn trade(pnl: f64) -> ClosedTrade {
        ClosedTrade {
            position: Position {
                id: PositionId("t".into()),
                symbol: "SOL".into(),
                side: PositionSide::Long,
                entry_price: 10.0,
                size_fraction: 0.1,
                notional: 100.0,
                stop_loss: 9.7,
                take_profit: 10.6,
                opened_at: Some(0),
                strategy: "rsi".into(),
            },
            exit_price: 10.5,
            closed_at: Some(60),
            exit_reason: ExitReason::Signal,
            pnl,
            pnl_fraction: pnl / 100.0,
        }
    }

    #[test]
    fn winner_and_loser_are_strict() {
        assert!(trade(1.0).is_winner());
        assert!(trade(-1.0).is_loser());
        let flat = trade(0.0);
        assert!(!flat.is_winner() && !flat.is_loser());
    }

    #[test]
    fn exit_reason_wire_names() {
        for (reason, name) in [
            (ExitReason::StopLoss, "stop_loss"),
            (ExitReason::TakeProfit, "take_profit"),
            (ExitReason::Signal, "signal"),
            (ExitReason::Final, "final"),
        ] {
            assert_eq!(reason.as_str(), name);
            assert_eq!(serde_json::to_string(&reason).unwrap(), format!("\"{name}\""));
        }
    }

    #[test]
    fn closed_trade_serialization_roundtrip() {
        let t = trade(-2.5);
        let json = serde_json::to_string(&t).unwrap();
        let deser: ClosedTrade = serde_json::from_str(&json).unwrap();
        assert_eq!(t, deser);
    }
}
