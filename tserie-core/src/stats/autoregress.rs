//! Autoregressive models fitted by conditional least squares.
//!
//! AR(p): `x[t] = c + φ1·x[t-1] + … + φp·x[t-p] + e[t]`
//!
//! ARIMA(p, d, 0) differences `d` times, fits AR(p) on the differenced
//! series, and integrates fitted values and forecasts back to levels.

use serde::{Deserialize, Serialize};

use super::linalg;
use super::returns::difference;
use super::{require, StatsError};

/// A fitted AR(p) model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArModel {
    pub lag: usize,
    pub intercept: f64,
    /// φ1..φp
    pub coefficients: Vec<f64>,
    /// Maximum-likelihood residual variance (SSE / nobs).
    pub sigma2: f64,
    pub aic: f64,
    /// Observations used in the regression (input length minus `lag`).
    pub nobs: usize,
    /// One-step-ahead in-sample predictions, aligned to `values[lag..]`.
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
}

impl ArModel {
    /// Mean squared one-step-ahead error over the fitted sample.
    pub fn mse(&self) -> f64 {
        self.sigma2
    }

    /// Predict `horizon` steps past the end of `history`, feeding each
    /// prediction back in as a lagged value.
    pub fn forecast(&self, history: &[f64], horizon: usize) -> Vec<f64> {
        if history.len() < self.lag {
            return vec![f64::NAN; horizon];
        }
        let mut window: Vec<f64> = history[history.len() - self.lag..].to_vec();
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let next = self.intercept
                + self
                    .coefficients
                    .iter()
                    .zip(window.iter().rev())
                    .map(|(phi, x)| phi * x)
                    .sum::<f64>();
            out.push(next);
            if self.lag > 0 {
                window.remove(0);
                window.push(next);
            }
        }
        out
    }
}

/// Schwert's upper bound for the lag search: ⌊12·(n/100)^¼⌋.
pub fn default_maxlag(nobs: usize) -> usize {
    (12.0 * (nobs as f64 / 100.0).powf(0.25)).floor() as usize
}

fn lagged_design(values: &[f64], lag: usize, skip: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let start = lag.max(skip);
    let design = (start..values.len())
        .map(|t| {
            std::iter::once(1.0)
                .chain((1..=lag).map(|i| values[t - i]))
                .collect()
        })
        .collect();
    (design, values[start..].to_vec())
}

fn fit_on(values: &[f64], lag: usize, skip: usize) -> Result<ArModel, StatsError> {
    let (design, target) = lagged_design(values, lag, skip);
    let fit = linalg::ols(&design, &target)?;
    let nobs = fit.nobs();
    let sigma2 = fit.sse / nobs as f64;
    Ok(ArModel {
        lag,
        intercept: fit.coefficients[0],
        coefficients: fit.coefficients[1..].to_vec(),
        sigma2,
        aic: nobs as f64 * sigma2.ln() + 2.0 * (lag + 1) as f64,
        nobs,
        fitted: fit.fitted,
        residuals: fit.residuals,
    })
}

/// Fit AR(`lag`) on every usable observation.
pub fn fit_ar(values: &[f64], lag: usize) -> Result<ArModel, StatsError> {
    if values.iter().any(|v| v.is_nan()) {
        return Err(StatsError::InvalidArgument("series contains NaN".into()));
    }
    require(2 * lag + 2, values.len())?;
    fit_on(values, lag, 0)
}

/// Choose the lag in `1..=maxlag` minimising AIC, then refit on the full
/// sample. Candidates are compared on the same observations (the first
/// `maxlag` are held out for all of them).
pub fn select_ar(values: &[f64], maxlag: usize) -> Result<ArModel, StatsError> {
    if maxlag == 0 {
        return Err(StatsError::InvalidArgument("maxlag must be >= 1".into()));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(StatsError::InvalidArgument("series contains NaN".into()));
    }
    require(2 * maxlag + 2, values.len())?;

    let mut best: Option<(usize, f64)> = None;
    for lag in 1..=maxlag {
        let candidate = fit_on(values, lag, maxlag)?;
        if best.map_or(true, |(_, aic)| candidate.aic < aic) {
            best = Some((lag, candidate.aic));
        }
    }
    let (lag, _) = best.ok_or(StatsError::Singular)?;
    fit_on(values, lag, 0)
}

/// ARIMA(p, d, 0) fit with a level forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaModel {
    pub p: usize,
    pub d: usize,
    /// The AR(p) fit on the `d`-times differenced series.
    pub ar: ArModel,
    /// In-sample one-step predictions in levels, aligned to `values[p + d..]`.
    pub fitted: Vec<f64>,
    /// Level forecasts for the requested horizon.
    pub forecast: Vec<f64>,
}

impl ArimaModel {
    pub fn mse(&self) -> f64 {
        self.ar.mse()
    }
}

pub fn fit_arima(
    values: &[f64],
    p: usize,
    d: usize,
    horizon: usize,
) -> Result<ArimaModel, StatsError> {
    let differenced = difference(values, d);
    let ar = fit_ar(&differenced, p)?;

    // Every term but the newest difference is known at t-1, so the level
    // error equals the differenced residual.
    let fitted = values[p + d..]
        .iter()
        .zip(&ar.residuals)
        .map(|(actual, resid)| actual - resid)
        .collect();

    let mut forecast = ar.forecast(&differenced, horizon);
    for order in (0..d).rev() {
        let base = difference(values, order);
        let mut level = base.last().copied().unwrap_or(f64::NAN);
        forecast = forecast
            .into_iter()
            .map(|step| {
                level += step;
                level
            })
            .collect();
    }

    Ok(ArimaModel {
        p,
        d,
        ar,
        fitted,
        forecast,
    })
}
