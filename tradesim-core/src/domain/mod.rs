//! Domain types for the trading simulator

pub mod candle;
pub mod ids;
pub mod position;
pub mod trade;

pub use candle::{closes, Candle};
pub use ids::PositionId;
pub use position::{Position, PositionSide, PositionState};
pub use trade::{ClosedTrade, ExitReason};
