//! Error types for the gdp_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the gdp_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Required panel columns are absent
    #[error("Schema mismatch: missing column(s) {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// The configured KPI does not occur in the panel
    #[error("KPI '{0}' not found in the panel")]
    KpiNotFound(String),

    /// A configured regressor indicator does not occur in the panel
    #[error("Regressor indicator '{0}' not found in the panel")]
    RegressorNotFound(String),

    /// A series has too few known points to interpolate
    #[error("Insufficient data for {country} ({series}): {known} known point(s), need at least 2")]
    InsufficientData {
        country: String,
        series: String,
        known: usize,
    },

    /// Error raised while fitting a model
    #[error("Model fit error: {0}")]
    ModelFitError(String),

    /// Error related to forecasting operations
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    MathError(#[from] outlook_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON encoding or decoding
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from parsing a text value
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<std::num::ParseIntError> for ForecastError {
    fn from(err: std::num::ParseIntError) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}

impl From<std::num::ParseFloatError> for ForecastError {
    fn from(err: std::num::ParseFloatError) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}

impl From<chrono::ParseError> for ForecastError {
    fn from(err: chrono::ParseError) -> Self {
        ForecastError::ParseError(err.to_string())
    }
}

impl From<tempfile::PersistError> for ForecastError {
    fn from(err: tempfile::PersistError) -> Self {
        ForecastError::IoError(err.error)
    }
}
