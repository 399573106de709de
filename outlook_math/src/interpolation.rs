//! Linear gap filling for sparse yearly series
//!
//! Values are interpolated against their x positions (years), so gaps in the
//! x axis are respected. Leading gaps are left untouched because there is no
//! earlier anchor; trailing gaps are held at the last known value.

use crate::{MathError, Result};

/// Count the known (non-missing, finite) values of a series
pub fn known_count(values: &[Option<f64>]) -> usize {
    values
        .iter()
        .filter(|v| matches!(v, Some(x) if x.is_finite()))
        .count()
}

/// Fill missing values by linear interpolation between known neighbours.
///
/// # Arguments
/// * `xs` - Strictly increasing x positions, one per value
/// * `values` - Series values, `None` marking a gap
///
/// # Returns
/// A series of the same length where every gap after the first known value
/// has been filled. Known values are returned unchanged.
///
/// # Errors
/// Fails when fewer than two known values exist or when `xs` is not strictly
/// increasing.
pub fn interpolate_linear(xs: &[f64], values: &[Option<f64>]) -> Result<Vec<Option<f64>>> {
    if xs.len() != values.len() {
        return Err(MathError::InvalidInput(format!(
            "x positions ({}) and values ({}) differ in length",
            xs.len(),
            values.len()
        )));
    }

    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(MathError::InvalidInput(
            "x positions must be strictly increasing".to_string(),
        ));
    }

    let known = known_count(values);
    if known < 2 {
        return Err(MathError::InsufficientData(format!(
            "interpolation needs at least 2 known points, got {}",
            known
        )));
    }

    let anchors: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|x| (i, x)))
        .collect();

    let mut filled: Vec<Option<f64>> = values
        .iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();

    // Interior gaps
    for pair in anchors.windows(2) {
        let (left, left_value) = pair[0];
        let (right, right_value) = pair[1];
        if right - left < 2 {
            continue;
        }

        let span = xs[right] - xs[left];
        for i in (left + 1)..right {
            let weight = (xs[i] - xs[left]) / span;
            filled[i] = Some(left_value + weight * (right_value - left_value));
        }
    }

    // Trailing gap
    if let Some(&(last, last_value)) = anchors.last() {
        for slot in filled.iter_mut().skip(last + 1) {
            *slot = Some(last_value);
        }
    }

    Ok(filled)
}
