//! Position sizers: decide what fraction of capital a new position commits.
//!
//! Sizers are signal-agnostic. They see only the risk settings of the
//! strategy and return a fraction in `[0, max_position_fraction]`.

pub mod fixed_fractional;

pub use fixed_fractional::FixedFractionalSizer;
