use serde::{Deserialize, Serialize};

use super::ids::PositionId;

/// Direction of an open position. The engine only trades long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "long",
        }
    }
}

/// An open position.
///
/// Prices are slippage-adjusted; `notional` is the capital committed at entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub symbol: String,
    pub side: PositionSide,
    pub entry_price: f64,
    /// Fraction of the capital basis committed to this position.
    pub size_fraction: f64,
    pub notional: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub opened_at: Option<i64>,
    /// Strategy kind that opened the position (e.g. "sma_cross").
    pub strategy: String,
}

impl Position {
    /// Mark-to-market P&L at `price`, before exit slippage and fees.
    ///
    /// Zero when the entry price is not positive.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        if self.entry_price <= 0.0 {
            return 0.0;
        }
        (price - self.entry_price) / self.entry_price * self.notional
    }
}

/// Position state for a single symbol: at most one open position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PositionState {
    #[default]
    Flat,
    Open(Position),
}

impl PositionState {
    pub fn is_open(&self) -> bool {
        matches!(self, PositionState::Open(_))
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            PositionState::Flat => None,
            PositionState::Open(p) => Some(p),
        }
    }
}

impl From<Option<Position>> for PositionState {
    fn from(position: Option<Position>) -> Self {
        match position {
            Some(p) => PositionState::Open(p),
            None => PositionState::Flat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Position {
        Position {
            id: PositionId("abc".into()),
            symbol: "BTC".into(),
            side: PositionSide::Long,
            entry_price: 100.0,
            size_fraction: 0.25,
            notional: 250.0,
            stop_loss: 97.0,
            take_profit: 106.0,
            opened_at: Some(1),
            strategy: "sma_cross".into(),
        }
    }

    #[test]
    fn unrealized_pnl_scales_with_notional() {
        let p = sample();
        assert!((p.unrealized_pnl(110.0) - 25.0).abs() < 1e-10);
        assert!((p.unrealized_pnl(90.0) + 25.0).abs() < 1e-10);
    }

    #[test]
    fn unrealized_pnl_zero_entry_is_zero() {
        let mut p = sample();
        p.entry_price = 0.0;
        assert_eq!(p.unrealized_pnl(110.0), 0.0);
    }

    #[test]
    fn state_from_option() {
        assert_eq!(PositionState::from(None), PositionState::Flat);
        assert!(PositionState::from(Some(sample())).is_open());
    }

    #[test]
    fn side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PositionSide::Long).unwrap(), "\"long\"");
    }
}
