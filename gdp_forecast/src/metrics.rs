//! Metrics for evaluating forecast performance
//!
//! All metrics use `error = actual - predicted` over the test window of one
//! country. MAPE is computed exactly as `mean(|error / actual|) * 100` with no
//! guard against small actuals: GDP growth crosses zero, so a near-zero actual
//! inflates MAPE and a zero actual makes it infinite or NaN. Such values are
//! returned unchanged and are not treated as errors.

use crate::error::{ForecastError, Result};
use crate::records::MetricRecord;
use chrono::NaiveDate;
use tracing::warn;

/// Actuals below this magnitude are flagged as distorting MAPE
pub const NEAR_ZERO_ACTUAL: f64 = 1.0;

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(
            "Actual and predicted values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// Root mean squared error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    Ok(mse.sqrt())
}

/// Mean absolute error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    Ok(actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64)
}

/// Mean absolute percentage error, in percent, without a zero guard
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    Ok(actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| ((a - p) / a).abs())
        .sum::<f64>()
        / actual.len() as f64
        * 100.0)
}

/// Pair each actual with the prediction for the same timestamp.
///
/// Every actual must have a prediction; predictions without an actual are
/// ignored.
pub fn align_by_timestamp(
    actual: &[(NaiveDate, f64)],
    predicted: &[(NaiveDate, f64)],
) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut a = Vec::with_capacity(actual.len());
    let mut p = Vec::with_capacity(actual.len());

    for (ds, value) in actual {
        let matched = predicted
            .iter()
            .find(|(pds, _)| pds == ds)
            .ok_or_else(|| {
                ForecastError::ValidationError(format!("No prediction for actual value at {}", ds))
            })?;
        a.push(*value);
        p.push(matched.1);
    }

    Ok((a, p))
}

/// Evaluate one country's test-window predictions
pub fn evaluate_forecast(
    country: &str,
    actual: &[(NaiveDate, f64)],
    predicted: &[(NaiveDate, f64)],
) -> Result<MetricRecord> {
    let (a, p) = align_by_timestamp(actual, predicted)?;

    let record = MetricRecord {
        country: country.to_string(),
        rmse: root_mean_squared_error(&a, &p)?,
        mae: mean_absolute_error(&a, &p)?,
        mape: mean_absolute_percentage_error(&a, &p)?,
    };

    if a.iter().any(|v| v.abs() < NEAR_ZERO_ACTUAL) {
        warn!(
            country,
            mape = record.mape,
            "test actuals near zero; MAPE is inflated"
        );
    }

    Ok(record)
}
