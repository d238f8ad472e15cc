//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a window, computed in one pass with a
//! running sum (add the newest close, subtract the one leaving the window).
//! First defined value at index `window - 1`.

/// Rolling arithmetic mean of `closes` over `window`.
///
/// Returns one entry per close; `None` before the window fills.
/// A zero window yields an all-`None` series.
pub fn sma_series(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut series = vec![None; closes.len()];
    if window == 0 {
        return series;
    }

    let mut sum = 0.0;
    for (i, &close) in closes.iter().enumerate() {
        sum += close;
        if i >= window {
            sum -= closes[i - window];
        }
        if i + 1 >= window {
            series[i] = Some(sum / window as f64);
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let result = sma_series(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0], 5);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().enumerate().take(4) {
            assert!(v.is_none(), "expected None at index {i}");
        }
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_approx(result[4].unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(result[5].unwrap(), 13.0, DEFAULT_EPSILON);
        assert_approx(result[6].unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let result = sma_series(&[100.0, 200.0, 300.0], 1);
        assert_eq!(result, vec![Some(100.0), Some(200.0), Some(300.0)]);
    }

    #[test]
    fn sma_zero_window_is_undefined() {
        assert!(sma_series(&[1.0, 2.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn sma_too_few_closes() {
        assert!(sma_series(&[10.0, 11.0], 5).iter().all(Option::is_none));
    }

    #[test]
    fn sma_matches_naive_mean() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let result = sma_series(&closes, 7);
        for i in 6..closes.len() {
            let naive = closes[i - 6..=i].iter().sum::<f64>() / 7.0;
            assert_approx(result[i].unwrap(), naive, 1e-9);
        }
    }
}
