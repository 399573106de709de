//! Additive trend + yearly seasonality + linear regressor model
//!
//! The prediction for a row is
//!
//! ```text
//! yhat = trend(t) + yearly(ds) + sum_r beta_r * (x_r - mu_r) / sd_r
//! ```
//!
//! with a piecewise-linear trend whose slope may change at changepoints placed
//! on the early part of the training span, and a Fourier series for the yearly
//! cycle. All coefficients are solved jointly by penalized least squares on a
//! scaled target; intercept and base slope are unpenalized.

use crate::error::{ForecastError, Result};
use crate::models::{
    FittedForecastModel, ForecastModel, Prediction, PredictionRow, RegressorFrame, TrainingFrame,
};
use crate::utils::days_since_epoch;
use outlook_math::fourier::{fourier_terms, YEARLY_PERIOD_DAYS};
use outlook_math::ridge_least_squares;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

/// Settings of the additive model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditiveConfig {
    /// Fourier order of the yearly seasonality
    pub yearly_fourier_order: usize,
    /// Upper bound on the number of trend changepoints
    pub n_changepoints: usize,
    /// Share of the training rows eligible to host changepoints
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub regressor_prior_scale: f64,
    /// Coverage of the uncertainty interval
    pub interval_width: f64,
    /// Fewest training rows a fit accepts
    pub min_train_points: usize,
}

impl Default for AdditiveConfig {
    fn default() -> Self {
        Self {
            yearly_fourier_order: 10,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            regressor_prior_scale: 10.0,
            interval_width: 0.8,
            min_train_points: 2,
        }
    }
}

impl AdditiveConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Interval width must be between 0 and 1".to_string(),
            ));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(
                "Changepoint range must be in (0, 1]".to_string(),
            ));
        }
        for (name, scale) in [
            ("changepoint", self.changepoint_prior_scale),
            ("seasonality", self.seasonality_prior_scale),
            ("regressor", self.regressor_prior_scale),
        ] {
            if !(scale > 0.0 && scale.is_finite()) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} prior scale must be positive",
                    name
                )));
            }
        }
        if self.min_train_points < 2 {
            return Err(ForecastError::InvalidParameter(
                "Minimum training points must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// Additive forecasting model
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    /// Name of the model
    name: String,
    config: AdditiveConfig,
}

/// Additive model fitted on one country
#[derive(Debug, Clone)]
pub struct FittedAdditiveModel {
    name: String,
    regressors: Vec<String>,
    fourier_order: usize,
    /// Origin and length of the training span, in days since epoch
    t_start: f64,
    t_span: f64,
    y_scale: f64,
    /// Changepoint locations on the scaled time axis
    changepoints: Vec<f64>,
    intercept: f64,
    slope: f64,
    deltas: Vec<f64>,
    seasonal_betas: Vec<f64>,
    regressor_betas: Vec<f64>,
    regressor_mu: Vec<f64>,
    regressor_sd: Vec<f64>,
    /// Residual standard deviation on the scaled target
    sigma: f64,
    /// Standard-normal quantile of the interval bound
    z: f64,
}

impl AdditiveModel {
    /// Create a new additive model
    pub fn new(config: AdditiveConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: format!(
                "Additive (changepoints<={}, yearly order={})",
                config.n_changepoints, config.yearly_fourier_order
            ),
            config,
        })
    }

    pub fn config(&self) -> &AdditiveConfig {
        &self.config
    }

    /// Row indices hosting changepoints, evenly spaced over the eligible rows
    fn changepoint_indices(&self, n: usize) -> Vec<usize> {
        let hist_size = (n as f64 * self.config.changepoint_range).floor() as usize;
        let count = self.config.n_changepoints.min(hist_size.saturating_sub(1));
        if count == 0 {
            return Vec::new();
        }

        let last = (hist_size - 1) as f64;
        (1..=count)
            .map(|i| (last * i as f64 / count as f64).round() as usize)
            .collect()
    }
}

impl Default for AdditiveModel {
    fn default() -> Self {
        Self {
            name: "Additive (changepoints<=25, yearly order=10)".to_string(),
            config: AdditiveConfig::default(),
        }
    }
}

impl ForecastModel for AdditiveModel {
    type Fitted = FittedAdditiveModel;

    fn fit(&self, frame: &TrainingFrame) -> Result<FittedAdditiveModel> {
        let n = frame.len();
        if n < self.config.min_train_points {
            return Err(ForecastError::ModelFitError(format!(
                "Need at least {} training rows, got {}",
                self.config.min_train_points, n
            )));
        }

        if let Some(row) = frame.frame().first_non_finite() {
            return Err(ForecastError::ModelFitError(format!(
                "Regressor values missing at training row {}",
                row
            )));
        }

        if frame.y().iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFitError(
                "Target has missing values".to_string(),
            ));
        }

        let ds = frame.frame().ds();
        if ds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ForecastError::ModelFitError(
                "Training timestamps must be strictly increasing".to_string(),
            ));
        }

        let t_start = days_since_epoch(ds[0]);
        let t_span = days_since_epoch(ds[n - 1]) - t_start;
        let t: Vec<f64> = ds
            .iter()
            .map(|d| (days_since_epoch(*d) - t_start) / t_span)
            .collect();

        let y_scale = match frame.y().iter().fold(0.0_f64, |m, v| m.max(v.abs())) {
            m if m > 0.0 => m,
            _ => 1.0,
        };
        let y_scaled: Vec<f64> = frame.y().iter().map(|v| v / y_scale).collect();

        let changepoints: Vec<f64> = self
            .changepoint_indices(n)
            .into_iter()
            .map(|i| t[i])
            .collect();

        let k = frame.frame().regressors().len();
        let mut regressor_mu = Vec::with_capacity(k);
        let mut regressor_sd = Vec::with_capacity(k);
        for j in 0..k {
            let column: Vec<f64> = frame.frame().values().iter().map(|row| row[j]).collect();
            let (mu, sd) = standardization(&column);
            regressor_mu.push(mu);
            regressor_sd.push(sd);
        }

        let order = self.config.yearly_fourier_order;
        let rows = ds
            .iter()
            .zip(&t)
            .zip(frame.frame().values())
            .map(|((d, &ti), values)| -> Result<Vec<f64>> {
                let mut row = vec![1.0, ti];
                row.extend(changepoints.iter().map(|s| (ti - s).max(0.0)));
                row.extend(fourier_terms(days_since_epoch(*d), YEARLY_PERIOD_DAYS, order)?);
                row.extend(
                    values
                        .iter()
                        .enumerate()
                        .map(|(j, x)| (x - regressor_mu[j]) / regressor_sd[j]),
                );
                Ok(row)
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let mut penalties = vec![0.0, 0.0];
        penalties.extend(vec![prior_penalty(self.config.changepoint_prior_scale); changepoints.len()]);
        penalties.extend(vec![prior_penalty(self.config.seasonality_prior_scale); 2 * order]);
        penalties.extend(vec![prior_penalty(self.config.regressor_prior_scale); k]);

        let beta = ridge_least_squares(&rows, &y_scaled, &penalties)
            .map_err(|e| ForecastError::ModelFitError(e.to_string()))?;

        let residual_ss: f64 = rows
            .iter()
            .zip(&y_scaled)
            .map(|(row, y)| {
                let fitted: f64 = row.iter().zip(&beta).map(|(x, b)| x * b).sum();
                (y - fitted).powi(2)
            })
            .sum();
        let sigma = (residual_ss / n as f64).sqrt();

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::ModelFitError(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + self.config.interval_width / 2.0);

        let cp_end = 2 + changepoints.len();
        let season_end = cp_end + 2 * order;

        debug!(
            rows = n,
            changepoints = changepoints.len(),
            sigma,
            "fitted additive model"
        );

        Ok(FittedAdditiveModel {
            name: self.name.clone(),
            regressors: frame.frame().regressors().to_vec(),
            fourier_order: order,
            t_start,
            t_span,
            y_scale,
            changepoints,
            intercept: beta[0],
            slope: beta[1],
            deltas: beta[2..cp_end].to_vec(),
            seasonal_betas: beta[cp_end..season_end].to_vec(),
            regressor_betas: beta[season_end..].to_vec(),
            regressor_mu,
            regressor_sd,
            sigma,
            z,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedAdditiveModel {
    /// Learned regressor coefficients on the standardized scale
    pub fn regressor_coefficients(&self) -> &[f64] {
        &self.regressor_betas
    }

    /// Changepoint locations on the scaled time axis
    pub fn changepoints(&self) -> &[f64] {
        &self.changepoints
    }

    /// Trend value on the scaled target
    fn trend_at(&self, t: f64) -> f64 {
        let shifts: f64 = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .map(|(s, delta)| delta * (t - s).max(0.0))
            .sum();
        self.intercept + self.slope * t + shifts
    }

    /// Variance added by possible trend changes past the training span.
    ///
    /// Changepoints arrive at the rate seen in training, each changing the
    /// slope by a Laplace draw with the mean absolute fitted delta as scale.
    fn trend_variance(&self, t: f64) -> f64 {
        let ahead = t - 1.0;
        if ahead <= 0.0 || self.deltas.is_empty() {
            return 0.0;
        }

        let rate = self.deltas.len() as f64;
        let scale = self.deltas.iter().map(|d| d.abs()).sum::<f64>() / rate + 1e-8;
        rate * 2.0 * scale.powi(2) * ahead.powi(3) / 3.0
    }
}

impl FittedForecastModel for FittedAdditiveModel {
    fn predict(&self, frame: &RegressorFrame) -> Result<Prediction> {
        if frame.regressors() != self.regressors.as_slice() {
            return Err(ForecastError::ForecastingError(format!(
                "Prediction regressors [{}] don't match fitted regressors [{}]",
                frame.regressors().join(", "),
                self.regressors.join(", ")
            )));
        }

        if let Some(row) = frame.first_non_finite() {
            return Err(ForecastError::ForecastingError(format!(
                "Regressor values missing at prediction row {}",
                row
            )));
        }

        let mut rows = Vec::with_capacity(frame.len());
        for (ds, values) in frame.ds().iter().zip(frame.values()) {
            let day = days_since_epoch(*ds);
            let t = (day - self.t_start) / self.t_span;

            let trend = self.trend_at(t) * self.y_scale;
            let seasonal = fourier_terms(day, YEARLY_PERIOD_DAYS, self.fourier_order)?
                .iter()
                .zip(&self.seasonal_betas)
                .map(|(f, b)| f * b)
                .sum::<f64>()
                * self.y_scale;
            let effects: Vec<f64> = values
                .iter()
                .enumerate()
                .map(|(j, x)| {
                    self.regressor_betas[j] * (x - self.regressor_mu[j]) / self.regressor_sd[j]
                        * self.y_scale
                })
                .collect();

            let yhat = trend + seasonal + effects.iter().sum::<f64>();
            let spread = self.z
                * (self.sigma.powi(2) + self.trend_variance(t)).sqrt()
                * self.y_scale;

            rows.push(PredictionRow {
                ds: *ds,
                yhat,
                yhat_lower: yhat - spread,
                yhat_upper: yhat + spread,
                trend,
                seasonal,
                effects,
            });
        }

        Ok(Prediction {
            regressors: self.regressors.clone(),
            rows,
        })
    }

    fn regressors(&self) -> &[String] {
        &self.regressors
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Ridge penalty equivalent to a Gaussian prior with the given scale
fn prior_penalty(scale: f64) -> f64 {
    1.0 / (scale * scale)
}

/// Mean and sample standard deviation; a constant column keeps unit scale
fn standardization(column: &[f64]) -> (f64, f64) {
    let n = column.len() as f64;
    let mu = column.iter().sum::<f64>() / n;
    if column.len() < 2 {
        return (mu, 1.0);
    }

    let sd = (column.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
    if sd > 0.0 && sd.is_finite() {
        (mu, sd)
    } else {
        (mu, 1.0)
    }
}
