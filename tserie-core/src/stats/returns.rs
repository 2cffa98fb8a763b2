//! One-step transforms from prices to returns.
//!
//! Each output is one element shorter than its input: element `i` relates
//! `values[i + 1]` to `values[i]`. NaN inputs propagate.

/// `x[t] / x[t-1] - 1`
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

/// `ln(x[t] / x[t-1])`. Non-positive prices give NaN.
pub fn log_diff(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| {
            if w[0] <= 0.0 || w[1] <= 0.0 {
                f64::NAN
            } else {
                w[1].ln() - w[0].ln()
            }
        })
        .collect()
}

/// `x[t] - x[t-1]`
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Difference `order` times. Order 0 returns the input unchanged.
pub fn difference(values: &[f64], order: usize) -> Vec<f64> {
    (0..order).fold(values.to_vec(), |acc, _| diff(&acc))
}
