//! Small dense least squares for the regressions in this crate.
//!
//! Design matrices here have a handful of columns (an intercept plus at most a
//! few dozen lags), so normal equations with partial-pivot elimination are
//! plenty.

use super::StatsError;

/// Result of an ordinary least squares fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Sum of squared residuals.
    pub sse: f64,
    /// Diagonal of (XᵀX)⁻¹, for coefficient standard errors.
    pub xtx_inv_diag: Vec<f64>,
}

impl OlsFit {
    pub fn nobs(&self) -> usize {
        self.residuals.len()
    }

    /// Residual variance with `n - k` degrees of freedom.
    pub fn sigma2(&self) -> f64 {
        let dof = self.nobs() as f64 - self.coefficients.len() as f64;
        if dof <= 0.0 {
            return f64::NAN;
        }
        self.sse / dof
    }

    /// Standard error of coefficient `i`.
    pub fn std_error(&self, i: usize) -> f64 {
        (self.sigma2() * self.xtx_inv_diag[i]).sqrt()
    }
}

/// Regress `y` on the rows of `design`. Every row must have the same width.
pub fn ols(design: &[Vec<f64>], y: &[f64]) -> Result<OlsFit, StatsError> {
    let n = y.len();
    if design.len() != n {
        return Err(StatsError::InvalidArgument(format!(
            "design has {} rows for {} observations",
            design.len(),
            n
        )));
    }
    let k = design.first().map_or(0, Vec::len);
    if k == 0 {
        return Err(StatsError::InvalidArgument("design has no columns".into()));
    }
    if n <= k {
        return Err(StatsError::TooFewObservations { needed: k + 1, got: n });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in design.iter().zip(y) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in i..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    let inverse = invert(&xtx).ok_or(StatsError::Singular)?;
    let coefficients: Vec<f64> = inverse
        .iter()
        .map(|row| row.iter().zip(&xty).map(|(a, b)| a * b).sum())
        .collect();

    let fitted: Vec<f64> = design
        .iter()
        .map(|row| row.iter().zip(&coefficients).map(|(x, b)| x * b).sum())
        .collect();
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(a, f)| a - f).collect();
    let sse = residuals.iter().map(|r| r * r).sum();
    let xtx_inv_diag = (0..k).map(|i| inverse[i][i]).collect();

    Ok(OlsFit {
        coefficients,
        fitted,
        residuals,
        sse,
        xtx_inv_diag,
    })
}

/// Gauss-Jordan inversion with partial pivoting. `None` if singular.
fn invert(matrix: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    let scale = matrix
        .iter()
        .flat_map(|r| r.iter())
        .fold(0.0_f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return None;
    }
    let tol = scale * 1e-12;

    let mut a: Vec<Vec<f64>> = matrix.to_vec();
    let mut inv: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < tol {
            return None;
        }
        a.swap(col, pivot);
        inv.swap(col, pivot);

        let p = a[col][col];
        for j in 0..n {
            a[col][j] /= p;
            inv[col][j] /= p;
        }
        let pivot_row = a[col].clone();
        let pivot_inv = inv[col].clone();
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                a[row][j] -= factor * pivot_row[j];
                inv[row][j] -= factor * pivot_inv[j];
            }
        }
    }
    Some(inv)
}
