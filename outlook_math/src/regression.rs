//! Penalized least squares
//!
//! Solves `(X'X + diag(penalties)) beta = X'y` through a Cholesky
//! factorization. A zero penalty leaves the coefficient unregularized.

use crate::{MathError, Result};

/// Diagonal jitter added to the normal equations for numerical stability
const JITTER: f64 = 1e-8;

/// Fit a ridge-style regression with a separate penalty per coefficient.
///
/// # Arguments
/// * `rows` - Design matrix, one row per observation
/// * `y` - Target values, one per row
/// * `penalties` - Non-negative penalty per column of the design matrix
///
/// # Returns
/// Coefficients, one per design column.
pub fn ridge_least_squares(rows: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    if rows.is_empty() {
        return Err(MathError::InsufficientData(
            "design matrix has no rows".to_string(),
        ));
    }

    if rows.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "design matrix has {} rows but target has {} values",
            rows.len(),
            y.len()
        )));
    }

    let k = penalties.len();
    if k == 0 {
        return Err(MathError::InvalidInput(
            "design matrix has no columns".to_string(),
        ));
    }

    if let Some(bad) = rows.iter().position(|row| row.len() != k) {
        return Err(MathError::InvalidInput(format!(
            "row {} has {} columns, expected {}",
            bad,
            rows[bad].len(),
            k
        )));
    }

    if penalties.iter().any(|p| *p < 0.0 || !p.is_finite()) {
        return Err(MathError::InvalidInput(
            "penalties must be finite and non-negative".to_string(),
        ));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];

    for (row, &target) in rows.iter().zip(y.iter()) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
        xtx[i][i] += penalties[i] + JITTER;
    }

    solve_symmetric(&xtx, &xty)
}

/// Solve `a x = b` for a symmetric positive definite `a` with Cholesky.
pub fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(format!(
            "expected a {}x{} system",
            n, n
        )));
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(MathError::CalculationError(
                        "matrix is not positive definite".to_string(),
                    ));
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward substitution: L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * z[j];
        }
        z[i] = sum / l[i][i];
    }

    // Back substitution: L' x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Ok(x)
}
