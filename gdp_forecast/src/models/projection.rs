//! Future regressor projection
//!
//! Regressor values past the last observed year are unknown. A projection
//! fills them in for the future horizon; the default holds the last observed
//! values constant.

use crate::error::{ForecastError, Result};
use crate::features::MergedRow;
use crate::models::RegressorFrame;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Supplies regressor values for dates beyond the observed history
pub trait RegressorProjection {
    /// Project regressors for `future` from the observed `history` rows
    fn project(
        &self,
        regressors: &[String],
        history: &[MergedRow],
        future: &[NaiveDate],
    ) -> Result<RegressorFrame>;
}

/// Hold the most recent year's values constant
#[derive(Debug, Clone, Copy, Default)]
pub struct LastObserved;

impl RegressorProjection for LastObserved {
    fn project(
        &self,
        regressors: &[String],
        history: &[MergedRow],
        future: &[NaiveDate],
    ) -> Result<RegressorFrame> {
        let latest = history.iter().max_by_key(|r| r.ds).ok_or_else(|| {
            ForecastError::DataError("No observed regressor values to project from".to_string())
        })?;

        RegressorFrame::new(
            regressors.to_vec(),
            future.to_vec(),
            vec![latest.values.clone(); future.len()],
        )
    }
}

/// Hold the mean of the last `window` years constant
#[derive(Debug, Clone, Copy)]
pub struct TrailingMean {
    window: usize,
}

impl TrailingMean {
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Trailing mean window must be at least 1".to_string(),
            ));
        }
        Ok(Self { window })
    }
}

impl RegressorProjection for TrailingMean {
    fn project(
        &self,
        regressors: &[String],
        history: &[MergedRow],
        future: &[NaiveDate],
    ) -> Result<RegressorFrame> {
        if history.is_empty() {
            return Err(ForecastError::DataError(
                "No observed regressor values to project from".to_string(),
            ));
        }

        if let Some(row) = history.iter().find(|r| r.values.len() != regressors.len()) {
            return Err(ForecastError::ValidationError(format!(
                "history row for {} has {} regressor values, expected {}",
                row.country,
                row.values.len(),
                regressors.len()
            )));
        }

        let mut recent: Vec<&MergedRow> = history.iter().collect();
        recent.sort_by_key(|r| r.ds);
        let recent = &recent[recent.len().saturating_sub(self.window)..];

        let means: Vec<f64> = (0..regressors.len())
            .map(|j| recent.iter().map(|r| r.values[j]).sum::<f64>() / recent.len() as f64)
            .collect();

        RegressorFrame::new(
            regressors.to_vec(),
            future.to_vec(),
            vec![means; future.len()],
        )
    }
}

/// Configurable choice of projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionStrategy {
    #[default]
    LastObserved,
    TrailingMean {
        window: usize,
    },
}

impl ProjectionStrategy {
    pub fn validate(&self) -> Result<()> {
        match self {
            ProjectionStrategy::LastObserved => Ok(()),
            ProjectionStrategy::TrailingMean { window } => TrailingMean::new(*window).map(|_| ()),
        }
    }
}

impl RegressorProjection for ProjectionStrategy {
    fn project(
        &self,
        regressors: &[String],
        history: &[MergedRow],
        future: &[NaiveDate],
    ) -> Result<RegressorFrame> {
        match self {
            ProjectionStrategy::LastObserved => LastObserved.project(regressors, history, future),
            ProjectionStrategy::TrailingMean { window } => {
                TrailingMean::new(*window)?.project(regressors, history, future)
            }
        }
    }
}
