//! Autocorrelation and partial autocorrelation.

use super::{finite, mean, require, StatsError};

/// Sample autocorrelation for lags `0..=nlags` (lag 0 is always 1).
///
/// Uses the biased estimator (denominator n at every lag), which keeps the
/// sequence positive semi-definite. NaN and infinite values are dropped first.
pub fn acf(values: &[f64], nlags: usize) -> Result<Vec<f64>, StatsError> {
    let x = finite(values);
    let n = x.len();
    require(nlags + 2, n)?;

    let m = mean(&x);
    let centered: Vec<f64> = x.iter().map(|v| v - m).collect();
    let c0: f64 = centered.iter().map(|v| v * v).sum();
    if c0 == 0.0 {
        return Err(StatsError::ZeroVariance);
    }

    Ok((0..=nlags)
        .map(|k| {
            let ck: f64 = centered[..n - k]
                .iter()
                .zip(&centered[k..])
                .map(|(a, b)| a * b)
                .sum();
            ck / c0
        })
        .collect())
}

/// Partial autocorrelation for lags `0..=nlags` via Durbin-Levinson on the
/// sample autocorrelations.
pub fn pacf(values: &[f64], nlags: usize) -> Result<Vec<f64>, StatsError> {
    let r = acf(values, nlags)?;
    let mut out = vec![1.0; nlags + 1];
    // phi[j] holds the AR(k) coefficients after step k.
    let mut phi: Vec<f64> = Vec::with_capacity(nlags);

    for k in 1..=nlags {
        let num = r[k] - (1..k).map(|j| phi[j - 1] * r[k - j]).sum::<f64>();
        let den = 1.0 - (1..k).map(|j| phi[j - 1] * r[j]).sum::<f64>();
        let phi_kk = if den.abs() < 1e-15 { 0.0 } else { num / den };

        let next: Vec<f64> = (1..k)
            .map(|j| phi[j - 1] - phi_kk * phi[k - j - 1])
            .chain(std::iter::once(phi_kk))
            .collect();
        phi = next;
        out[k] = phi_kk;
    }
    Ok(out)
}

/// Half-width of the approximate 95% band for white noise: 1.96 / √n.
pub fn confidence_band(nobs: usize) -> f64 {
    if nobs == 0 {
        return f64::NAN;
    }
    1.96 / (nobs as f64).sqrt()
}
