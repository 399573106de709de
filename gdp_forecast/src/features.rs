//! Regressor merging and train/test partitioning
//!
//! [`FeatureMerger`] attaches the configured macro indicators to the KPI
//! series. The KPI observations drive a left join on (country, year), so no
//! observation year is lost when a regressor is missing for that year. Gaps
//! are interpolated per country; rows still incomplete afterwards (leading
//! gaps) are dropped across the whole panel. A country with a regressor that
//! cannot be interpolated is left out and listed in [`MergedPanel::excluded`].

use crate::cleaning::{interpolate_series, CleanedPanel, Observation};
use crate::config::{RegressorSpec, SplitConfig};
use crate::data::RawPanel;
use crate::error::{ForecastError, Result};
use crate::utils::split_by_year;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// KPI value plus regressor values for one (country, year)
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub country: String,
    pub ds: NaiveDate,
    pub y: f64,
    /// Regressor values aligned with [`MergedPanel::regressors`]
    pub values: Vec<f64>,
}

impl MergedRow {
    pub fn year(&self) -> i32 {
        self.ds.year()
    }
}

/// Multivariate long-form panel, sorted by country then date
#[derive(Debug, Clone, PartialEq)]
pub struct MergedPanel {
    regressors: Vec<String>,
    rows: Vec<MergedRow>,
    excluded: BTreeMap<String, String>,
}

impl MergedPanel {
    pub fn new(regressors: Vec<String>, mut rows: Vec<MergedRow>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|r| r.values.len() != regressors.len()) {
            return Err(ForecastError::ValidationError(format!(
                "row for {} in {} has {} regressor values, expected {}",
                row.country,
                row.year(),
                row.values.len(),
                regressors.len()
            )));
        }

        rows.sort_by(|a, b| a.country.cmp(&b.country).then(a.ds.cmp(&b.ds)));
        Ok(Self {
            regressors,
            rows,
            excluded: BTreeMap::new(),
        })
    }

    /// Regressor column names in configuration order
    pub fn regressors(&self) -> &[String] {
        &self.regressors
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    /// Countries left out during the merge, with the reason
    pub fn excluded(&self) -> &BTreeMap<String, String> {
        &self.excluded
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn countries(&self) -> Vec<String> {
        let mut countries: Vec<String> = self.rows.iter().map(|r| r.country.clone()).collect();
        countries.dedup();
        countries
    }

    /// Partition into train and test panels by year
    pub fn split(&self, split: &SplitConfig) -> (MergedPanel, MergedPanel) {
        let (train, test) = split_by_year(&self.rows, |r| r.ds, split);
        (
            MergedPanel {
                regressors: self.regressors.clone(),
                rows: train,
                excluded: BTreeMap::new(),
            },
            MergedPanel {
                regressors: self.regressors.clone(),
                rows: test,
                excluded: BTreeMap::new(),
            },
        )
    }
}

/// Train and test rows of one country
#[derive(Debug, Clone, PartialEq)]
pub struct CountryDataset {
    pub country: String,
    pub regressors: Vec<String>,
    pub train: Vec<MergedRow>,
    pub test: Vec<MergedRow>,
}

impl CountryDataset {
    /// Train rows followed by test rows
    pub fn history(&self) -> impl Iterator<Item = &MergedRow> {
        self.train.iter().chain(self.test.iter())
    }

    pub fn last_year(&self) -> Option<i32> {
        self.history().map(|r| r.year()).max()
    }
}

/// Group train and test panels into one dataset per country
pub fn country_datasets(train: &MergedPanel, test: &MergedPanel) -> BTreeMap<String, CountryDataset> {
    let mut datasets: BTreeMap<String, CountryDataset> = BTreeMap::new();

    for (panel, is_train) in [(train, true), (test, false)] {
        for row in panel.rows() {
            let dataset = datasets
                .entry(row.country.clone())
                .or_insert_with(|| CountryDataset {
                    country: row.country.clone(),
                    regressors: panel.regressors().to_vec(),
                    train: Vec::new(),
                    test: Vec::new(),
                });

            if is_train {
                dataset.train.push(row.clone());
            } else {
                dataset.test.push(row.clone());
            }
        }
    }

    datasets
}

/// Joins regressor indicators onto the cleaned KPI series
#[derive(Debug, Clone)]
pub struct FeatureMerger {
    regressors: Vec<RegressorSpec>,
}

impl FeatureMerger {
    pub fn new(regressors: Vec<RegressorSpec>) -> Self {
        Self { regressors }
    }

    pub fn regressor_columns(&self) -> Vec<String> {
        self.regressors.iter().map(|r| r.column.clone()).collect()
    }

    /// Merge, interpolate and drop incomplete rows
    pub fn merge(&self, observations: &CleanedPanel, panel: &RawPanel) -> Result<MergedPanel> {
        if observations.has_missing() {
            return Err(ForecastError::DataError(
                "KPI series still has missing values; drop leading gaps before merging".to_string(),
            ));
        }

        let lookups = self
            .regressors
            .iter()
            .map(|spec| regressor_lookup(spec, panel))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(observations.len());
        let mut dropped = 0usize;
        let mut excluded = BTreeMap::new();

        for country in observations.countries() {
            let series: Vec<_> = observations.series(&country).collect();

            let columns = match self.interpolate_columns(&country, &series, &lookups) {
                Ok(columns) => columns,
                Err(err @ ForecastError::InsufficientData { .. }) => {
                    warn!(country = %country, error = %err, "excluding country from merged panel");
                    excluded.insert(country.clone(), err.to_string());
                    continue;
                }
                Err(err) => return Err(err),
            };

            for (i, observation) in series.iter().enumerate() {
                let values: Option<Vec<f64>> = columns.iter().map(|column| column[i]).collect();
                match (observation.value, values) {
                    (Some(y), Some(values)) => rows.push(MergedRow {
                        country: country.clone(),
                        ds: observation.ds,
                        y,
                        values,
                    }),
                    _ => dropped += 1,
                }
            }
        }

        if dropped > 0 {
            warn!(dropped, "dropped rows with regressor values missing after interpolation");
        }

        let mut merged = MergedPanel::new(self.regressor_columns(), rows)?;
        merged.excluded = excluded;
        info!(
            rows = merged.len(),
            regressors = self.regressors.len(),
            excluded = merged.excluded.len(),
            "merged regressors onto KPI series"
        );
        Ok(merged)
    }

    /// Left-join and interpolate every regressor for one country's years
    fn interpolate_columns(
        &self,
        country: &str,
        series: &[&Observation],
        lookups: &[BTreeMap<(String, i32), Option<f64>>],
    ) -> Result<Vec<Vec<Option<f64>>>> {
        self.regressors
            .iter()
            .zip(lookups)
            .map(|(spec, lookup)| {
                let points: Vec<(i32, Option<f64>)> = series
                    .iter()
                    .map(|o| {
                        let value = lookup.get(&(country.to_string(), o.year())).copied().flatten();
                        (o.year(), value)
                    })
                    .collect();
                interpolate_series(country, &spec.column, &points)
            })
            .collect()
    }
}

/// Index one regressor indicator by (country, year)
fn regressor_lookup(
    spec: &RegressorSpec,
    panel: &RawPanel,
) -> Result<BTreeMap<(String, i32), Option<f64>>> {
    if !panel.has_indicator(&spec.indicator) {
        return Err(ForecastError::RegressorNotFound(spec.indicator.clone()));
    }

    let mut lookup = BTreeMap::new();
    let mut seen = Vec::new();
    for row in panel.rows_for_indicator(&spec.indicator) {
        if seen.contains(&row.country) {
            return Err(ForecastError::DataError(format!(
                "regressor '{}' occurs more than once for {}",
                spec.indicator, row.country
            )));
        }
        seen.push(row.country.clone());

        for (year, value) in &row.values {
            lookup.insert((row.country.clone(), *year), *value);
        }
    }

    Ok(lookup)
}
