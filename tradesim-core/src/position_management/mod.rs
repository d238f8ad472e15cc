//! Position management: the single-position state machine.
//!
//! **Module Structure:**
//! - `manager`: `PositionManager` (Flat ⇄ Open), sizing, fills and exits
//!
//! One manager owns one symbol's position for its whole lifetime. The
//! backtest drives it across every candle; the paper trader rebuilds it from
//! persisted state and drives it for exactly one step.

pub mod manager;

pub use manager::{exit_reason, round4, PositionManager, Transition};
