//! Signal generation: stateless classification of indicator values.
//!
//! Signals depend only on the precomputed indicator series and an index. They
//! never see position state, so the backtest and the paper trader classify the
//! same candle identically.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::indicators::IndicatorSeries;

/// What the indicators say at one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// Open a long position if flat.
    Enter,
    /// Close the open position.
    Exit,
    #[default]
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Enter => "enter",
            Signal::Exit => "exit",
            Signal::Hold => "hold",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the indicator values at `idx`.
///
/// Moving-average pair: Enter on an upward cross of fast over slow, Exit on a
/// downward cross. Equal values count as not crossed.
/// RSI: Enter strictly below `lower`, Exit strictly above `upper`.
///
/// Index 0, an out-of-range index, or an undefined value yields `Hold`.
pub fn signal_at(series: &IndicatorSeries, idx: usize) -> Signal {
    if idx == 0 || idx >= series.len() {
        return Signal::Hold;
    }
    match series {
        IndicatorSeries::MovingAveragePair { fast, slow, .. } => {
            let (Some(f_prev), Some(s_prev), Some(f_cur), Some(s_cur)) =
                (fast[idx - 1], slow[idx - 1], fast[idx], slow[idx])
            else {
                return Signal::Hold;
            };
            if f_prev <= s_prev && f_cur > s_cur {
                Signal::Enter
            } else if f_prev >= s_prev && f_cur < s_cur {
                Signal::Exit
            } else {
                Signal::Hold
            }
        }
        IndicatorSeries::Rsi {
            values,
            lower,
            upper,
            ..
        } => {
            let Some(cur) = values[idx] else {
                return Signal::Hold;
            };
            if cur < *lower {
                Signal::Enter
            } else if cur > *upper {
                Signal::Exit
            } else {
                Signal::Hold
            }
        }
    }
}
