//! Statistics over aligned series.
//!
//! Pure functions, slices in and numbers out. NaN marks "no value" throughout:
//! warm-up rows of rolling windows, gaps, undefined ratios.

pub mod acf;
pub mod autoregress;
pub mod distributions;
pub mod histogram;
pub mod linalg;
pub mod regression;
pub mod returns;
pub mod rolling;
pub mod stationarity;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub use acf::{acf, confidence_band, pacf};
pub use autoregress::{default_maxlag, fit_ar, fit_arima, select_ar, ArModel, ArimaModel};
pub use histogram::{histogram, Histogram};
pub use regression::{ols, Regression};
pub use stationarity::{
    adfuller, make_stationary, make_stationary_auto, AdfResult, CriticalValues, StationaryResult,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("need at least {needed} observations, got {got}")]
    TooFewObservations { needed: usize, got: usize },

    #[error("design matrix is singular")]
    Singular,

    #[error("series has zero variance")]
    ZeroVariance,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator).
pub(crate) fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub(crate) fn require(needed: usize, got: usize) -> Result<(), StatsError> {
    if got < needed {
        return Err(StatsError::TooFewObservations { needed, got });
    }
    Ok(())
}

/// Drop NaN and infinite entries.
pub(crate) fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// JSON has no NaN or infinity, so serde_json writes them as `null`. Read
/// `null` back as NaN.
pub fn nan_from_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, eps: f64) {
    assert!(
        (actual - expected).abs() < eps,
        "expected {expected}, got {actual} (eps {eps})"
    );
}
