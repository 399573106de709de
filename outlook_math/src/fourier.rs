//! Fourier series terms for seasonal features

use crate::{MathError, Result};
use std::f64::consts::PI;

/// Period of the yearly cycle in days
pub const YEARLY_PERIOD_DAYS: f64 = 365.25;

/// Compute `[sin(2πkt/P), cos(2πkt/P)]` for `k = 1..=order`.
///
/// The returned vector has `2 * order` entries, sine and cosine interleaved.
pub fn fourier_terms(t_days: f64, period: f64, order: usize) -> Result<Vec<f64>> {
    if period <= 0.0 || !period.is_finite() {
        return Err(MathError::InvalidInput(format!(
            "period must be positive, got {}",
            period
        )));
    }

    let mut terms = Vec::with_capacity(2 * order);
    for k in 1..=order {
        let angle = 2.0 * PI * k as f64 * t_days / period;
        terms.push(angle.sin());
        terms.push(angle.cos());
    }

    Ok(terms)
}
