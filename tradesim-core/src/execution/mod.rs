//! Execution costs: slippage-adjusted fill prices and fees.

pub mod cost_model;

pub use cost_model::CostModel;
