//! # Outlook Math
//!
//! Numerical building blocks for the GDP outlook pipeline.
//! This crate provides gap interpolation for yearly series, Fourier terms
//! for seasonal features and a penalized least-squares solver.

use thiserror::Error;

pub mod fourier;
pub mod interpolation;
pub mod regression;

pub use interpolation::{interpolate_linear, known_count};
pub use regression::{ridge_least_squares, solve_symmetric};

/// Errors that can occur in numerical routines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;
