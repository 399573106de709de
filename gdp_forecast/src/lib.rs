//! # GDP Forecast
//!
//! Per-country forecasting of real GDP growth from a wide macroeconomic
//! indicator panel.
//!
//! ## Features
//!
//! - Panel loading with an explicit, validated column schema
//! - KPI extraction and per-country linear gap filling
//! - Regressor merging (fiscal balance, current account, inflation)
//! - Additive trend + yearly seasonality + regressor model, one per country
//! - Test-window evaluation (RMSE, MAE, MAPE) and component attribution
//! - A JSON result bundle plus CSV and text artifacts for the dashboard
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gdp_forecast::config::PipelineConfig;
//! use gdp_forecast::data::PanelLoader;
//! use gdp_forecast::pipeline::Pipeline;
//! use std::path::Path;
//!
//! # fn main() -> gdp_forecast::Result<()> {
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let panel = PanelLoader::from_csv("indicators.csv", &pipeline.config().schema)?;
//!
//! let output = pipeline.run_to_dir(&panel, Path::new("output"))?;
//! for metrics in output.bundle.metrics.values() {
//!     println!("{}", metrics);
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod attribution;
pub mod bundle;
pub mod cleaning;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod insights;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod records;
pub mod synthetic;
pub mod utils;

// Re-export commonly used types
pub use crate::bundle::ResultBundle;
pub use crate::cleaning::{CleanedPanel, Observation, PanelCleaner};
pub use crate::config::PipelineConfig;
pub use crate::data::{PanelLoader, RawPanel};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeatureMerger, MergedPanel};
pub use crate::models::{FittedForecastModel, ForecastModel};
pub use crate::pipeline::Pipeline;
pub use crate::records::{ComponentRecord, ForecastRecord, ImportanceRecord, MetricRecord, Segment};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
