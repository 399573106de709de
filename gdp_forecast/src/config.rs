//! Pipeline configuration
//!
//! Every setting has a default matching the African Economic Outlook setup:
//! three target countries, real GDP growth as KPI, three macro regressors, a
//! 2015/2016 train/test boundary and a five-year horizon.

use crate::error::{ForecastError, Result};
use crate::models::additive::AdditiveConfig;
use crate::models::projection::ProjectionStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Column names used by the artifacts themselves
const RESERVED_COLUMNS: [&str; 6] = ["Country", "ds", "y", "trend", "yearly", "Regressors_Effect"];

/// Column names the raw panel must provide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSchema {
    /// Column holding the country name
    pub country_column: String,
    /// Column holding the indicator name
    pub indicator_column: String,
    /// Secondary indicator column also matched against the KPI when present
    pub alt_indicator_column: Option<String>,
}

impl Default for PanelSchema {
    fn default() -> Self {
        Self {
            country_column: "Country and Regions Name".to_string(),
            indicator_column: "Indicators Name".to_string(),
            alt_indicator_column: Some("Indicators".to_string()),
        }
    }
}

/// A regressor indicator and the column name it takes after reshaping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorSpec {
    /// Indicator name as it appears in the panel
    pub indicator: String,
    /// Short column name used in artifacts and model frames
    pub column: String,
}

impl RegressorSpec {
    pub fn new(indicator: &str, column: &str) -> Self {
        Self {
            indicator: indicator.to_string(),
            column: column.to_string(),
        }
    }
}

/// Year boundaries of the train and test windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Last year (inclusive) of the training window
    pub train_end: i32,
    /// First year of the test window
    pub test_start: i32,
    /// Last year (inclusive) of the test window
    pub test_end: i32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_end: 2015,
            test_start: 2016,
            test_end: 2020,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.train_end >= self.test_start {
            return Err(ForecastError::InvalidParameter(format!(
                "train window must end before the test window starts ({} >= {})",
                self.train_end, self.test_start
            )));
        }
        if self.test_start > self.test_end {
            return Err(ForecastError::InvalidParameter(format!(
                "test window is empty ({}..={})",
                self.test_start, self.test_end
            )));
        }
        Ok(())
    }
}

/// File names of the artifacts written by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactNames {
    pub filtered_panel: String,
    pub clean_series: String,
    pub merged_series: String,
    pub train: String,
    pub test: String,
    pub bundle: String,
    pub importance: String,
    pub eda_insights: String,
    pub model_insights: String,
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            filtered_panel: "initial_filtered_data.csv".to_string(),
            clean_series: "gdp_growth_clean_data.csv".to_string(),
            merged_series: "gdp_growth_multivariate_data.csv".to_string(),
            train: "train_data.csv".to_string(),
            test: "test_data.csv".to_string(),
            bundle: "forecasting_results.json".to_string(),
            importance: "feature_importance_data.csv".to_string(),
            eda_insights: "eda_insights.txt".to_string(),
            model_insights: "model_insights.txt".to_string(),
        }
    }
}

/// Complete configuration of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub schema: PanelSchema,
    /// Exact indicator name of the forecast target
    pub target_kpi: String,
    /// Countries to keep; empty keeps every country in the panel
    pub countries: Vec<String>,
    pub regressors: Vec<RegressorSpec>,
    pub split: SplitConfig,
    /// Number of years forecast past the end of the test window
    pub horizon_years: usize,
    pub projection: ProjectionStrategy,
    pub model: AdditiveConfig,
    pub artifacts: ArtifactNames,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema: PanelSchema::default(),
            target_kpi: "Real GDP growth (annual %)".to_string(),
            countries: vec![
                "Kenya".to_string(),
                "South Africa".to_string(),
                "Nigeria".to_string(),
            ],
            regressors: vec![
                RegressorSpec::new("Central government, Fiscal Balance (% of GDP)", "Fiscal_Balance"),
                RegressorSpec::new(
                    "Current account balance (As % of GDP)",
                    "Current_Account_Balance",
                ),
                RegressorSpec::new("Inflation, consumer prices (annual %)", "Inflation"),
            ],
            split: SplitConfig::default(),
            horizon_years: 5,
            projection: ProjectionStrategy::default(),
            model: AdditiveConfig::default(),
            artifacts: ArtifactNames::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; absent keys keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Column names of the configured regressors, in configuration order
    pub fn regressor_columns(&self) -> Vec<String> {
        self.regressors.iter().map(|r| r.column.clone()).collect()
    }

    /// Check the settings for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.target_kpi.trim().is_empty() {
            return Err(ForecastError::InvalidParameter(
                "target KPI must not be empty".to_string(),
            ));
        }

        if self.horizon_years == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must cover at least one year".to_string(),
            ));
        }

        let mut columns = self.regressor_columns();
        columns.sort();
        columns.dedup();
        if columns.len() != self.regressors.len() {
            return Err(ForecastError::InvalidParameter(
                "regressor column names must be unique".to_string(),
            ));
        }

        if let Some(clash) = self
            .regressors
            .iter()
            .find(|r| RESERVED_COLUMNS.contains(&r.column.as_str()))
        {
            return Err(ForecastError::InvalidParameter(format!(
                "regressor column '{}' collides with a reserved column",
                clash.column
            )));
        }

        self.split.validate()?;
        self.projection.validate()?;
        self.model.validate()?;
        Ok(())
    }
}
