//! Strategy configuration: indicator family, parameters, costs and risk limits.
//!
//! Passed explicitly into every engine entry point; the engine holds no
//! process-wide defaults. Parameters live in a `BTreeMap` so serialization and
//! hashing are deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors from strategy configuration validation and parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("invalid strategy TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Indicator family driving the strategy.
///
/// Unrecognised names are kept as `Unknown` and run with the moving-average
/// pair and default parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StrategyKind {
    #[default]
    SmaCross,
    Rsi,
    Unknown(String),
}

impl StrategyKind {
    pub fn as_str(&self) -> &str {
        match self {
            StrategyKind::SmaCross => "sma_cross",
            StrategyKind::Rsi => "rsi",
            StrategyKind::Unknown(name) => name,
        }
    }
}

impl From<String> for StrategyKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "sma_cross" => StrategyKind::SmaCross,
            "rsi" => StrategyKind::Rsi,
            _ => StrategyKind::Unknown(name),
        }
    }
}

impl From<&str> for StrategyKind {
    fn from(name: &str) -> Self {
        StrategyKind::from(name.to_string())
    }
}

impl From<StrategyKind> for String {
    fn from(kind: StrategyKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete strategy configuration for one backtest or paper tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    /// Indicator parameters: `fast`/`slow` for SMA, `period`/`lower`/`upper` for RSI.
    pub params: BTreeMap<String, f64>,
    /// Fee per side in basis points.
    pub fee_bps: f64,
    /// Adverse slippage per side in basis points.
    pub slippage_bps: f64,
    /// Fraction of capital risked per trade (fixed-fractional sizing).
    pub risk_per_trade: f64,
    pub stop_loss_fraction: f64,
    pub take_profit_fraction: f64,
    /// Upper bound on the position size fraction.
    pub max_position_fraction: f64,
    pub starting_capital: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::SmaCross,
            params: BTreeMap::new(),
            fee_bps: 5.0,
            slippage_bps: 2.0,
            risk_per_trade: 0.02,
            stop_loss_fraction: 0.03,
            take_profit_fraction: 0.06,
            max_position_fraction: 0.25,
            starting_capital: 1000.0,
        }
    }
}

impl StrategyConfig {
    /// Moving-average cross with the given windows and default costs.
    pub fn sma_cross(fast: usize, slow: usize) -> Self {
        Self::default()
            .with_param("fast", fast as f64)
            .with_param("slow", slow as f64)
    }

    /// RSI reversion with the given period and thresholds and default costs.
    pub fn rsi(period: usize, lower: f64, upper: f64) -> Self {
        Self {
            kind: StrategyKind::Rsi,
            ..Self::default()
        }
        .with_param("period", period as f64)
        .with_param("lower", lower)
        .with_param("upper", upper)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_capital(mut self, capital: f64) -> Self {
        self.starting_capital = capital;
        self
    }

    pub fn with_costs(mut self, fee_bps: f64, slippage_bps: f64) -> Self {
        self.fee_bps = fee_bps;
        self.slippage_bps = slippage_bps;
        self
    }

    /// Parameter value, or `default` when absent.
    pub fn param(&self, key: &str, default: f64) -> f64 {
        self.params.get(key).copied().unwrap_or(default)
    }

    /// Parse from a TOML document (missing keys take defaults).
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that rates and fractions are non-negative and capital is finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("fee_bps", self.fee_bps),
            ("slippage_bps", self.slippage_bps),
            ("risk_per_trade", self.risk_per_trade),
            ("stop_loss_fraction", self.stop_loss_fraction),
            ("take_profit_fraction", self.take_profit_fraction),
            ("max_position_fraction", self.max_position_fraction),
            ("starting_capital", self.starting_capital),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }

    /// Stable BLAKE3 fingerprint of the full configuration.
    ///
    /// Floats are hashed by bit pattern, so any parameter change yields a new hash.
    pub fn full_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.kind.as_str().as_bytes());
        for (key, value) in &self.params {
            hasher.update(b"|");
            hasher.update(key.as_bytes());
            hasher.update(&value.to_bits().to_le_bytes());
        }
        for value in [
            self.fee_bps,
            self.slippage_bps,
            self.risk_per_trade,
            self.stop_loss_fraction,
            self.take_profit_fraction,
            self.max_position_fraction,
            self.starting_capital,
        ] {
            hasher.update(&value.to_bits().to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}
