//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and average losses.
//! The first value sits at index `period`, seeded from the simple average of
//! the first `period` deltas; each later value updates incrementally:
//! `avg = (avg * (period - 1) + x) / period`.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss); avg_loss == 0 → RSI = 100.

/// Wilder RSI over `closes`.
///
/// Returns one entry per close; `None` before index `period` or when there
/// are not enough closes. A zero period yields an all-`None` series.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut series = vec![None; n];
    if period == 0 || n <= period {
        return series;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let delta = closes[i] - closes[i - 1];
        avg_gain += delta.max(0.0);
        avg_loss += (-delta).max(0.0);
    }
    let p = period as f64;
    avg_gain /= p;
    avg_loss /= p;
    series[period] = Some(compute_rsi(avg_gain, avg_loss));

    for i in (period + 1)..n {
        let delta = closes[i] - closes[i - 1];
        avg_gain = (avg_gain * (p - 1.0) + delta.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-delta).max(0.0)) / p;
        series[i] = Some(compute_rsi(avg_gain, avg_loss));
    }
    series
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        // Infinite relative strength, including the no-movement case.
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains() {
        let result = rsi_series(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0], 3);
        assert_approx(result[3].unwrap(), 100.0, 1e-9);
        assert_approx(result[5].unwrap(), 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses() {
        let result = rsi_series(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0], 3);
        assert_approx(result[3].unwrap(), 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_prices_are_100() {
        let result = rsi_series(&[50.0; 10], 4);
        assert!(result[..4].iter().all(Option::is_none));
        assert!(result[4..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn rsi_seed_and_wilder_update() {
        // Changes: +0.34, -0.25, -0.48, +0.72
        // period=3 seed: avg_gain = 0.34/3, avg_loss = 0.73/3
        let closes = [44.0, 44.34, 44.09, 43.61, 44.33];
        let result = rsi_series(&closes, 3);
        assert!(result[..3].iter().all(Option::is_none));

        let (g, l) = (0.34 / 3.0, 0.73 / 3.0);
        assert_approx(result[3].unwrap(), 100.0 - 100.0 / (1.0 + g / l), 1e-9);

        let g2 = (g * 2.0 + 0.72) / 3.0;
        let l2 = (l * 2.0) / 3.0;
        assert_approx(result[4].unwrap(), 100.0 - 100.0 / (1.0 + g2 / l2), 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let closes = [100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0];
        for (i, v) in rsi_series(&closes, 3).iter().enumerate() {
            if let Some(v) = v {
                assert!((0.0..=100.0).contains(v), "RSI out of bounds at {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_not_enough_closes() {
        assert!(rsi_series(&[1.0, 2.0, 3.0], 3).iter().all(Option::is_none));
        assert!(rsi_series(&[1.0, 2.0, 3.0], 0).iter().all(Option::is_none));
    }
}
