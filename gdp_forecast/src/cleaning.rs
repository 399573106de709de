//! Target KPI extraction and gap filling
//!
//! [`PanelCleaner`] selects the KPI rows of a raw panel, reshapes the year
//! columns into a long series per country and fills gaps by linear
//! interpolation within each country. Leading gaps cannot be filled and are
//! kept as missing; callers drop them with [`CleanedPanel::drop_missing`]
//! before fitting anything. A country whose series has fewer than two known
//! values is left out and listed in [`CleanedPanel::excluded`].

use crate::data::RawPanel;
use crate::error::{ForecastError, Result};
use crate::utils::year_start;
use chrono::{Datelike, NaiveDate};
use outlook_math::{interpolate_linear, known_count, MathError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// One yearly value of the target KPI for one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "Country")]
    pub country: String,
    pub ds: NaiveDate,
    #[serde(rename = "y")]
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(country: &str, ds: NaiveDate, value: Option<f64>) -> Self {
        Self {
            country: country.to_string(),
            ds,
            value,
        }
    }

    pub fn year(&self) -> i32 {
        self.ds.year()
    }
}

/// Long-form KPI series for all countries, sorted by country then date
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleanedPanel {
    observations: Vec<Observation>,
    excluded: BTreeMap<String, String>,
}

impl CleanedPanel {
    /// Build a panel, sorting the observations and rejecting duplicates
    pub fn new(mut observations: Vec<Observation>) -> Result<Self> {
        observations.sort_by(|a, b| a.country.cmp(&b.country).then(a.ds.cmp(&b.ds)));

        if let Some(pair) = observations
            .windows(2)
            .find(|w| w[0].country == w[1].country && w[0].ds == w[1].ds)
        {
            return Err(ForecastError::DataError(format!(
                "duplicate observation for {} in {}",
                pair[0].country,
                pair[0].year()
            )));
        }

        Ok(Self {
            observations,
            excluded: BTreeMap::new(),
        })
    }

    /// Countries left out because their series could not be interpolated
    pub fn excluded(&self) -> &BTreeMap<String, String> {
        &self.excluded
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Countries in ascending order
    pub fn countries(&self) -> Vec<String> {
        let mut countries: Vec<String> = self
            .observations
            .iter()
            .map(|o| o.country.clone())
            .collect();
        countries.dedup();
        countries
    }

    /// Observations of one country in chronological order
    pub fn series<'a>(&'a self, country: &'a str) -> impl Iterator<Item = &'a Observation> {
        self.observations
            .iter()
            .filter(move |o| o.country == country)
    }

    /// Whether any value is still missing
    pub fn has_missing(&self) -> bool {
        self.observations.iter().any(|o| o.value.is_none())
    }

    /// Drop observations whose value is missing (the leading gaps)
    pub fn drop_missing(&self) -> CleanedPanel {
        CleanedPanel {
            observations: self
                .observations
                .iter()
                .filter(|o| o.value.is_some())
                .cloned()
                .collect(),
            excluded: self.excluded.clone(),
        }
    }
}

/// Selects and cleans the target KPI from a raw panel
#[derive(Debug, Clone)]
pub struct PanelCleaner {
    target_kpi: String,
}

impl PanelCleaner {
    pub fn new(target_kpi: &str) -> Self {
        Self {
            target_kpi: target_kpi.to_string(),
        }
    }

    pub fn target_kpi(&self) -> &str {
        &self.target_kpi
    }

    /// Extract, reshape, sort and interpolate the KPI for every country
    pub fn clean(&self, panel: &RawPanel) -> Result<CleanedPanel> {
        let mut by_country: BTreeMap<String, BTreeMap<i32, Option<f64>>> = BTreeMap::new();

        for row in panel.rows_for_indicator(&self.target_kpi) {
            if by_country.contains_key(&row.country) {
                return Err(ForecastError::DataError(format!(
                    "KPI '{}' occurs more than once for {}",
                    self.target_kpi, row.country
                )));
            }
            by_country.insert(row.country.clone(), row.values.clone());
        }

        if by_country.is_empty() {
            return Err(ForecastError::KpiNotFound(self.target_kpi.clone()));
        }

        let mut observations = Vec::new();
        let mut excluded = BTreeMap::new();
        for (country, values) in &by_country {
            let points: Vec<(i32, Option<f64>)> = values.iter().map(|(y, v)| (*y, *v)).collect();
            let filled = match interpolate_series(country, &self.target_kpi, &points) {
                Ok(filled) => filled,
                Err(err @ ForecastError::InsufficientData { .. }) => {
                    warn!(country = %country, error = %err, "excluding country from KPI series");
                    excluded.insert(country.clone(), err.to_string());
                    continue;
                }
                Err(err) => return Err(err),
            };

            debug!(
                country = %country,
                filled = filled.iter().zip(&points).filter(|(f, p)| f.is_some() && p.1.is_none()).count(),
                "interpolated KPI gaps"
            );

            for ((year, _), value) in points.iter().zip(filled) {
                observations.push(Observation {
                    country: country.clone(),
                    ds: year_start(*year)?,
                    value,
                });
            }
        }

        info!(
            kpi = %self.target_kpi,
            countries = by_country.len() - excluded.len(),
            excluded = excluded.len(),
            observations = observations.len(),
            "cleaned KPI series"
        );

        let mut cleaned = CleanedPanel::new(observations)?;
        cleaned.excluded = excluded;
        Ok(cleaned)
    }
}

/// Interpolate one country's yearly series, naming the country on failure
pub(crate) fn interpolate_series(
    country: &str,
    series: &str,
    points: &[(i32, Option<f64>)],
) -> Result<Vec<Option<f64>>> {
    let xs: Vec<f64> = points.iter().map(|(year, _)| *year as f64).collect();
    let values: Vec<Option<f64>> = points.iter().map(|(_, v)| *v).collect();

    interpolate_linear(&xs, &values).map_err(|err| match err {
        MathError::InsufficientData(_) => ForecastError::InsufficientData {
            country: country.to_string(),
            series: series.to_string(),
            known: known_count(&values),
        },
        other => ForecastError::MathError(other),
    })
}
