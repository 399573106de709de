//! Utility functions for the gdp_forecast crate

use crate::config::SplitConfig;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};

/// Timestamp format used by every artifact
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Day number of 1970-01-01 counted from 0001-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// January 1st of the given year
pub fn year_start(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| ForecastError::ValidationError(format!("Year {} is out of range", year)))
}

/// Parse an ISO `YYYY-MM-DD` timestamp
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)?)
}

/// Format a timestamp as ISO `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Which window a year belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Train,
    Test,
    Outside,
}

/// Classify a date against the train/test windows
pub fn window_of(date: NaiveDate, split: &SplitConfig) -> Window {
    let year = date.year();
    if year <= split.train_end {
        Window::Train
    } else if year >= split.test_start && year <= split.test_end {
        Window::Test
    } else {
        Window::Outside
    }
}

/// Split rows into training and test sets by the year of their timestamp
pub fn split_by_year<T: Clone>(
    rows: &[T],
    date_of: impl Fn(&T) -> NaiveDate,
    split: &SplitConfig,
) -> (Vec<T>, Vec<T>) {
    let mut train = Vec::new();
    let mut test = Vec::new();

    for row in rows {
        match window_of(date_of(row), split) {
            Window::Train => train.push(row.clone()),
            Window::Test => test.push(row.clone()),
            Window::Outside => {}
        }
    }

    (train, test)
}

/// Create yearly timestamps following the given year
pub fn future_years(last_year: i32, horizon: usize) -> Result<Vec<NaiveDate>> {
    (1..=horizon)
        .map(|step| year_start(last_year + step as i32))
        .collect()
}

/// Days elapsed since the Unix epoch, as a float
pub fn days_since_epoch(date: NaiveDate) -> f64 {
    (date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE) as f64
}
