//! Simple linear regression of one series on another.
//!
//! Backs the "joint" comparison of two instruments: slope, intercept and the
//! Pearson correlation annotated on a scatter plot.

use serde::{Deserialize, Serialize};

use super::distributions::t_two_sided_p;
use super::{mean, nan_from_null, require, StatsError};

/// OLS fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    /// Pairs used (rows where either side is NaN or infinite are skipped).
    pub n: usize,
    #[serde(deserialize_with = "nan_from_null")]
    pub slope: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub intercept: f64,
    /// Pearson correlation coefficient.
    #[serde(deserialize_with = "nan_from_null")]
    pub r: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub r_squared: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub slope_stderr: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub t_stat: f64,
    /// Two-sided p-value for H0: slope = 0.
    #[serde(deserialize_with = "nan_from_null")]
    pub p_value: f64,
}

impl Regression {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

pub fn ols(x: &[f64], y: &[f64]) -> Result<Regression, StatsError> {
    if x.len() != y.len() {
        return Err(StatsError::InvalidArgument(format!(
            "x has {} values, y has {}",
            x.len(),
            y.len()
        )));
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip();
    let n = xs.len();
    require(3, n)?;

    let mx = mean(&xs);
    let my = mean(&ys);
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (a, b) in xs.iter().zip(&ys) {
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
        sxy += (a - mx) * (b - my);
    }
    if sxx == 0.0 {
        return Err(StatsError::ZeroVariance);
    }

    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    let r = if syy == 0.0 { 0.0 } else { sxy / (sxx * syy).sqrt() };

    let dof = (n - 2) as f64;
    let sse = (syy - slope * sxy).max(0.0);
    let slope_stderr = (sse / dof / sxx).sqrt();
    let t_stat = if slope_stderr == 0.0 {
        if slope == 0.0 {
            0.0
        } else {
            f64::INFINITY.copysign(slope)
        }
    } else {
        slope / slope_stderr
    };

    Ok(Regression {
        n,
        slope,
        intercept,
        r,
        r_squared: r * r,
        slope_stderr,
        t_stat,
        p_value: t_two_sided_p(t_stat, dof),
    })
}
