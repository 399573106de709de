//! # Outlook Workspace
//!
//! Umbrella crate for the GDP outlook tools. It re-exports the forecasting
//! pipeline and its numerical building blocks under one name.
//!
//! ## Example
//!
//! ```
//! use outlook_workspace::forecast::config::PipelineConfig;
//! use outlook_workspace::forecast::pipeline::Pipeline;
//! use outlook_workspace::forecast::synthetic::SyntheticPanel;
//!
//! let config = PipelineConfig::default();
//! let panel = SyntheticPanel::with_seed(1).generate(&config).unwrap();
//! let output = Pipeline::new(config).unwrap().run(&panel).unwrap();
//!
//! assert_eq!(output.bundle.countries().len(), 3);
//! ```

pub use gdp_forecast as forecast;
pub use outlook_math as math;

/// Version of the forecasting crate
pub const VERSION: &str = gdp_forecast::VERSION;
