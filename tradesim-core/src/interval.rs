//! Candle interval labels ("1m", "15m", "4h", "1d", "1w") and annualization.

/// Periods per year used when an interval label cannot be parsed.
pub const DEFAULT_PERIODS_PER_YEAR: f64 = 365.0;

/// Unit suffix of an interval label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Minute,
    Hour,
    Day,
    Week,
}

impl IntervalUnit {
    fn from_suffix(c: char) -> Option<Self> {
        match c {
            'm' => Some(IntervalUnit::Minute),
            'h' => Some(IntervalUnit::Hour),
            'd' => Some(IntervalUnit::Day),
            'w' => Some(IntervalUnit::Week),
            _ => None,
        }
    }

    /// Number of single units in a year.
    fn per_year(&self) -> f64 {
        match self {
            IntervalUnit::Minute => 365.0 * 24.0 * 60.0,
            IntervalUnit::Hour => 365.0 * 24.0,
            IntervalUnit::Day => 365.0,
            IntervalUnit::Week => 52.0,
        }
    }
}

/// Parse a label into its numeric value and unit.
pub fn parse_interval(label: &str) -> Option<(f64, IntervalUnit)> {
    let unit_char = label.chars().last()?;
    let unit = IntervalUnit::from_suffix(unit_char)?;
    let value: f64 = label[..label.len() - unit_char.len_utf8()].parse().ok()?;
    value.is_finite().then_some((value, unit))
}

/// Number of candles of this interval per year.
///
/// Values below one are treated as one; unparsable labels fall back to
/// [`DEFAULT_PERIODS_PER_YEAR`].
pub fn annualization_factor(label: &str) -> f64 {
    match parse_interval(label) {
        Some((value, unit)) => unit.per_year() / value.max(1.0),
        None => DEFAULT_PERIODS_PER_YEAR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_units() {
        assert_eq!(annualization_factor("1m"), 525_600.0);
        assert_eq!(annualization_factor("15m"), 35_040.0);
        assert_eq!(annualization_factor("1h"), 8_760.0);
        assert_eq!(annualization_factor("4h"), 2_190.0);
        assert_eq!(annualization_factor("1d"), 365.0);
        assert_eq!(annualization_factor("1w"), 52.0);
    }

    #[test]
    fn sub_unit_values_clamp_to_one() {
        assert_eq!(annualization_factor("0h"), 8_760.0);
        assert_eq!(annualization_factor("0.5d"), 365.0);
    }

    #[test]
    fn unparsable_labels_fall_back() {
        assert_eq!(annualization_factor(""), DEFAULT_PERIODS_PER_YEAR);
        assert_eq!(annualization_factor("1M"), DEFAULT_PERIODS_PER_YEAR);
        assert_eq!(annualization_factor("h"), DEFAULT_PERIODS_PER_YEAR);
        assert_eq!(annualization_factor("xd"), DEFAULT_PERIODS_PER_YEAR);
    }

    #[test]
    fn parse_returns_value_and_unit() {
        assert_eq!(parse_interval("30m"), Some((30.0, IntervalUnit::Minute)));
    }
}
