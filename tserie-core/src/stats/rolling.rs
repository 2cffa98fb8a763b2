//! Trailing-window statistics.
//!
//! Output has the same length as the input. The first `window - 1` entries are
//! NaN, and any window containing a NaN yields NaN.

use super::{mean, sample_variance};

/// Rolling mean. A window of 0 yields all NaN.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, 1, mean)
}

/// Rolling sample standard deviation (n - 1 denominator). Windows smaller
/// than 2 have no sample deviation and yield all NaN.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, 2, |w| sample_variance(w).sqrt())
}

fn rolling_apply(
    values: &[f64],
    window: usize,
    min_window: usize,
    f: impl Fn(&[f64]) -> f64,
) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window < min_window || n < window {
        return out;
    }
    for end in window..=n {
        let w = &values[end - window..end];
        if w.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[end - 1] = f(w);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::assert_approx;

    #[test]
    fn rolling_std_matches_hand_computation() {
        let r = rolling_std(&[1.0, 2.0, 3.0, 5.0], 3);
        assert!(r[0].is_nan());
        assert!(r[1].is_nan());
        // std(1,2,3) = 1
        assert_approx(r[2], 1.0, 1e-12);
        // std(2,3,5): mean 10/3, ss = 14/9 + 1/9 + 25/9 = 40/9, var = 20/9
        assert_approx(r[3], (20.0_f64 / 9.0).sqrt(), 1e-12);
    }

    #[test]
    fn rolling_std_nan_in_window() {
        let r = rolling_std(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(r[1].is_nan());
        assert!(r[2].is_nan());
        assert_approx(r[3], (0.5_f64).sqrt(), 1e-12);
    }

    #[test]
    fn window_larger_than_input_is_all_nan() {
        assert!(rolling_std(&[1.0, 2.0], 250).iter().all(|v| v.is_nan()));
        assert!(rolling_std(&[1.0, 2.0], 1).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_mean_basic() {
        let r = rolling_mean(&[10.0, 11.0, 12.0, 13.0], 2);
        assert!(r[0].is_nan());
        assert_approx(r[1], 10.5, 1e-12);
        assert_approx(r[3], 12.5, 1e-12);
    }
}
