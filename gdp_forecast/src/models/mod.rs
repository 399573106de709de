//! Forecasting models for yearly series with exogenous regressors
//!
//! A model is configured once and fitted per country; the fitted value owns
//! everything it learned and is never shared between countries.

use crate::error::{ForecastError, Result};
use crate::features::MergedRow;
use chrono::NaiveDate;
use std::fmt::Debug;

pub mod additive;
pub mod projection;

/// Timestamps plus regressor values, the input of a prediction
#[derive(Debug, Clone, PartialEq)]
pub struct RegressorFrame {
    regressors: Vec<String>,
    ds: Vec<NaiveDate>,
    /// Row-major regressor values aligned with `regressors`
    values: Vec<Vec<f64>>,
}

impl RegressorFrame {
    pub fn new(regressors: Vec<String>, ds: Vec<NaiveDate>, values: Vec<Vec<f64>>) -> Result<Self> {
        if ds.len() != values.len() {
            return Err(ForecastError::ValidationError(format!(
                "Timestamps length ({}) doesn't match rows length ({})",
                ds.len(),
                values.len()
            )));
        }

        if let Some(row) = values.iter().find(|row| row.len() != regressors.len()) {
            return Err(ForecastError::ValidationError(format!(
                "Row has {} regressor values, expected {}",
                row.len(),
                regressors.len()
            )));
        }

        Ok(Self {
            regressors,
            ds,
            values,
        })
    }

    /// Build a frame from merged rows
    pub fn from_rows(regressors: &[String], rows: &[MergedRow]) -> Result<Self> {
        Self::new(
            regressors.to_vec(),
            rows.iter().map(|r| r.ds).collect(),
            rows.iter().map(|r| r.values.clone()).collect(),
        )
    }

    pub fn regressors(&self) -> &[String] {
        &self.regressors
    }

    pub fn ds(&self) -> &[NaiveDate] {
        &self.ds
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.ds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ds.is_empty()
    }

    /// Position of the first row holding a missing or non-finite regressor
    pub fn first_non_finite(&self) -> Option<usize> {
        self.values
            .iter()
            .position(|row| row.iter().any(|v| !v.is_finite()))
    }
}

/// Regressor frame plus observed target values, the input of a fit
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingFrame {
    frame: RegressorFrame,
    y: Vec<f64>,
}

impl TrainingFrame {
    pub fn new(frame: RegressorFrame, y: Vec<f64>) -> Result<Self> {
        if frame.len() != y.len() {
            return Err(ForecastError::ValidationError(format!(
                "Target length ({}) doesn't match frame length ({})",
                y.len(),
                frame.len()
            )));
        }
        Ok(Self { frame, y })
    }

    pub fn from_rows(regressors: &[String], rows: &[MergedRow]) -> Result<Self> {
        Self::new(
            RegressorFrame::from_rows(regressors, rows)?,
            rows.iter().map(|r| r.y).collect(),
        )
    }

    pub fn frame(&self) -> &RegressorFrame {
        &self.frame
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// One predicted row with its additive breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub trend: f64,
    pub seasonal: f64,
    /// Additive effect per regressor, aligned with [`Prediction::regressors`]
    pub effects: Vec<f64>,
}

impl PredictionRow {
    /// Sum of all regressor effects
    pub fn regressors_effect(&self) -> f64 {
        self.effects.iter().sum()
    }
}

/// Output of a prediction call
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub regressors: Vec<String>,
    pub rows: Vec<PredictionRow>,
}

impl Prediction {
    /// Point estimate for the given timestamp
    pub fn point_at(&self, ds: NaiveDate) -> Option<f64> {
        self.rows.iter().find(|r| r.ds == ds).map(|r| r.yhat)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fitted model scoped to one country
pub trait FittedForecastModel: Debug {
    /// Predict point, interval and components for every row of the frame
    fn predict(&self, frame: &RegressorFrame) -> Result<Prediction>;

    /// Regressors the model was fitted with, in order
    fn regressors(&self) -> &[String];

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be fitted on one country's training frame
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedForecastModel;

    /// Fit the model on a training frame
    fn fit(&self, frame: &TrainingFrame) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}
