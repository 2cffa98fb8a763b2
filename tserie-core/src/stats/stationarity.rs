//! Augmented Dickey-Fuller unit-root test and stationarity transforms.
//!
//! Test regression (constant, no trend):
//! `Δx[t] = α + γ·x[t-1] + Σ β_i·Δx[t-i] + e[t]`, statistic = γ̂ / se(γ̂).
//! Critical values follow MacKinnon (2010); the p-value uses MacKinnon's
//! (1994) normal-CDF polynomial approximation.

use serde::{Deserialize, Serialize};

use super::distributions::normal_cdf;
use super::linalg;
use super::returns::diff;
use super::{nan_from_null, require, StatsError};
use crate::domain::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

impl CriticalValues {
    /// Constant-only, single-series MacKinnon (2010) response surface.
    pub fn for_nobs(nobs: usize) -> Self {
        let t = nobs as f64;
        let surface = |b: [f64; 4]| b[0] + b[1] / t + b[2] / (t * t) + b[3] / (t * t * t);
        Self {
            one_pct: surface([-3.43035, -6.5393, -16.786, -79.433]),
            five_pct: surface([-2.86154, -2.8903, -4.234, -40.040]),
            ten_pct: surface([-2.56677, -1.5384, -2.809, 0.0]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    #[serde(deserialize_with = "nan_from_null")]
    pub statistic: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub p_value: f64,
    /// Lagged differences included in the test regression.
    pub used_lag: usize,
    /// Observations in the test regression.
    pub nobs: usize,
    pub critical_values: CriticalValues,
}

impl AdfResult {
    /// True when the unit-root null is rejected at `alpha`.
    pub fn is_stationary(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// MacKinnon approximate p-value for the constant-only ADF statistic.
pub fn mackinnon_p(statistic: f64) -> f64 {
    const TAU_MAX: f64 = 2.74;
    const TAU_MIN: f64 = -18.83;
    const TAU_STAR: f64 = -1.61;
    const SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
    const LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }
    let coeffs: &[f64] = if statistic <= TAU_STAR {
        &SMALL_P
    } else {
        &LARGE_P
    };
    let poly = coeffs
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * statistic + c);
    normal_cdf(poly)
}

/// Build the ADF regression for `lag` lagged differences, holding out the
/// first `skip` differences so different lags share a sample.
fn adf_regression(
    values: &[f64],
    lag: usize,
    skip: usize,
) -> Result<linalg::OlsFit, StatsError> {
    let dx = diff(values);
    let start = lag.max(skip);
    let mut design = Vec::with_capacity(dx.len().saturating_sub(start));
    let mut target = Vec::with_capacity(design.capacity());
    for t in start..dx.len() {
        // dx[t] = values[t + 1] - values[t], so the level lag is values[t].
        let mut row = Vec::with_capacity(lag + 2);
        row.push(values[t]);
        row.extend((1..=lag).map(|i| dx[t - i]));
        row.push(1.0);
        design.push(row);
        target.push(dx[t]);
    }
    linalg::ols(&design, &target)
}

fn aic(fit: &linalg::OlsFit) -> f64 {
    let n = fit.nobs() as f64;
    n * (fit.sse / n).ln() + 2.0 * fit.coefficients.len() as f64
}

/// Augmented Dickey-Fuller test. With `maxlag = None` the search bound is
/// ⌈12·(n/100)^¼⌉; the lag is chosen by AIC over `0..=maxlag`.
pub fn adfuller(values: &[f64], maxlag: Option<usize>) -> Result<AdfResult, StatsError> {
    if values.iter().any(|v| v.is_nan()) {
        return Err(StatsError::InvalidArgument("series contains NaN".into()));
    }
    let n = values.len();
    let mut maxlag =
        maxlag.unwrap_or_else(|| (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize);
    // Keep enough degrees of freedom for the largest regression.
    maxlag = maxlag.min((n / 2).saturating_sub(2));
    require(6, n)?;

    let mut best: Option<(usize, f64)> = None;
    for lag in 0..=maxlag {
        let fit = adf_regression(values, lag, maxlag)?;
        let score = aic(&fit);
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((lag, score));
        }
    }
    let (used_lag, _) = best.ok_or(StatsError::Singular)?;

    let fit = adf_regression(values, used_lag, 0)?;
    let statistic = fit.coefficients[0] / fit.std_error(0);
    let nobs = fit.nobs();

    Ok(AdfResult {
        statistic,
        p_value: mackinnon_p(statistic),
        used_lag,
        nobs,
        critical_values: CriticalValues::for_nobs(nobs),
    })
}

/// Outcome of [`make_stationary_auto`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationaryResult {
    /// Transforms applied in order; empty if the input already passed.
    pub steps: Vec<Transform>,
    pub values: Vec<f64>,
    pub adf: AdfResult,
}

/// Apply one transform and test the result.
pub fn make_stationary(values: &[f64], transform: Transform) -> Result<StationaryResult, StatsError> {
    let transformed = transform.apply(values);
    if transformed.iter().any(|v| v.is_nan()) {
        return Err(StatsError::InvalidArgument(format!(
            "{} produced undefined values",
            transform.label()
        )));
    }
    let adf = adfuller(&transformed, None)?;
    Ok(StationaryResult {
        steps: vec![transform],
        values: transformed,
        adf,
    })
}

/// Transform until the ADF test rejects a unit root at `alpha`, trying a log
/// difference first for strictly positive series, then plain differencing,
/// for at most `max_steps` transforms.
pub fn make_stationary_auto(
    values: &[f64],
    alpha: f64,
    max_steps: usize,
) -> Result<StationaryResult, StatsError> {
    let mut current = values.to_vec();
    let mut steps = Vec::new();
    let mut adf = adfuller(&current, None)?;

    while !adf.is_stationary(alpha) && steps.len() < max_steps {
        let step = if steps.is_empty() && current.iter().all(|v| *v > 0.0) {
            Transform::LogDiff
        } else {
            Transform::Diff
        };
        current = step.apply(&current);
        steps.push(step);
        adf = adfuller(&current, None)?;
    }

    Ok(StationaryResult {
        steps,
        values: current,
        adf,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::assert_approx;

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 11) as f64 / (1u64 << 53) as f64) - 0.5
            })
            .collect()
    }

    fn random_walk(n: usize, seed: u64) -> Vec<f64> {
        let mut level = 100.0;
        noise(n, seed)
            .into_iter()
            .map(|e| {
                level += e;
                level
            })
            .collect()
    }

    #[test]
    fn white_noise_is_stationary() {
        let x = noise(1_000, 11);
        let adf = adfuller(&x, None).unwrap();
        assert!(adf.statistic < adf.critical_values.one_pct);
        assert!(adf.is_stationary(0.01));
    }

    #[test]
    fn random_walk_is_not_stationary() {
        let x = random_walk(1_000, 5);
        let adf = adfuller(&x, None).unwrap();
        assert!(!adf.is_stationary(0.01), "statistic {}", adf.statistic);
    }

    #[test]
    fn critical_values_are_ordered() {
        let cv = CriticalValues::for_nobs(500);
        assert!(cv.one_pct < cv.five_pct && cv.five_pct < cv.ten_pct);
        assert_approx(cv.five_pct, -2.8673, 1e-3);
    }

    #[test]
    fn mackinnon_p_matches_reference_points() {
        // At the 5% asymptotic critical value the p-value is about 0.05.
        assert_approx(mackinnon_p(-2.86), 0.05, 0.01);
        assert_eq!(mackinnon_p(5.0), 1.0);
        assert_eq!(mackinnon_p(-30.0), 0.0);
    }

    #[test]
    fn auto_differencing_stationarises_random_walk() {
        let x = random_walk(800, 9);
        let result = make_stationary_auto(&x, 0.05, 2).unwrap();
        assert_eq!(result.steps, vec![Transform::LogDiff]);
        assert_eq!(result.values.len(), x.len() - 1);
        assert!(result.adf.is_stationary(0.05));
    }

    #[test]
    fn explicit_transform_is_recorded() {
        let x = random_walk(400, 2);
        let result = make_stationary(&x, Transform::Diff).unwrap();
        assert_eq!(result.steps, vec![Transform::Diff]);
        assert_eq!(result.values.len(), 399);
    }

    #[test]
    fn log_diff_of_negative_series_is_rejected() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 - 25.0).collect();
        assert!(make_stationary(&x, Transform::LogDiff).is_err());
    }

    #[test]
    fn stationary_input_is_left_alone() {
        let x = noise(500, 1);
        let result = make_stationary_auto(&x, 0.05, 2).unwrap();
        assert!(result.steps.is_empty());
        assert_eq!(result.values, x);
    }
}
