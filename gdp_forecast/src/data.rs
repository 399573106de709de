//! Raw indicator panel handling
//!
//! The raw panel is wide: one row per (country, indicator) and one column per
//! calendar year. Columns are located through an explicit [`PanelSchema`];
//! anything missing is reported as a schema mismatch.

use crate::config::PanelSchema;
use crate::error::{ForecastError, Result};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

/// One (country, indicator) row of the wide panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub country: String,
    pub indicator: String,
    /// Value of the alternate indicator column, when the schema has one
    pub alt_indicator: Option<String>,
    /// Value per year; `None` marks an empty or non-numeric cell
    pub values: BTreeMap<i32, Option<f64>>,
}

impl PanelRow {
    pub fn new(country: &str, indicator: &str, values: &[(i32, Option<f64>)]) -> Self {
        Self {
            country: country.to_string(),
            indicator: indicator.to_string(),
            alt_indicator: None,
            values: values.iter().copied().collect(),
        }
    }

    /// Whether this row carries the given indicator in either indicator column
    pub fn matches_indicator(&self, name: &str) -> bool {
        self.indicator == name || self.alt_indicator.as_deref() == Some(name)
    }
}

/// Wide multi-country, multi-indicator panel
#[derive(Debug, Clone, PartialEq)]
pub struct RawPanel {
    schema: PanelSchema,
    years: Vec<i32>,
    rows: Vec<PanelRow>,
}

/// Loader for raw panels
#[derive(Debug)]
pub struct PanelLoader;

impl PanelLoader {
    /// Load a wide panel from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, schema: &PanelSchema) -> Result<RawPanel> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        info!(path = %path.display(), rows = df.height(), "loaded raw panel");
        Self::from_dataframe(df, schema)
    }

    /// Create a panel from an existing DataFrame
    pub fn from_dataframe(df: DataFrame, schema: &PanelSchema) -> Result<RawPanel> {
        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let missing: Vec<String> = [&schema.country_column, &schema.indicator_column]
            .into_iter()
            .filter(|required| !column_names.contains(*required))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ForecastError::SchemaMismatch { missing });
        }

        let year_columns: Vec<(i32, &String)> = column_names
            .iter()
            .filter(|name| is_year_column(name))
            .map(|name| name.parse::<i32>().map(|year| (year, name)))
            .collect::<std::result::Result<_, _>>()?;
        if year_columns.is_empty() {
            return Err(ForecastError::SchemaMismatch {
                missing: vec!["<four-digit year columns>".to_string()],
            });
        }

        let countries = utf8_column(&df, &schema.country_column)?;
        let indicators = utf8_column(&df, &schema.indicator_column)?;
        let alt_indicators = match &schema.alt_indicator_column {
            Some(name) if column_names.contains(name) => Some(utf8_column(&df, name)?),
            _ => None,
        };

        let mut year_values = Vec::with_capacity(year_columns.len());
        for (year, name) in &year_columns {
            year_values.push((*year, f64_column(&df, name)?));
        }

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let Some(country) = countries[i].clone() else {
                debug!(row = i, "skipping panel row without a country");
                continue;
            };

            let values = year_values
                .iter()
                .map(|(year, column)| (*year, column[i]))
                .collect();

            rows.push(PanelRow {
                country,
                indicator: indicators[i].clone().unwrap_or_default(),
                alt_indicator: alt_indicators.as_ref().and_then(|alt| alt[i].clone()),
                values,
            });
        }

        let mut years: Vec<i32> = year_columns.iter().map(|(year, _)| *year).collect();
        years.sort_unstable();

        Ok(RawPanel {
            schema: schema.clone(),
            years,
            rows,
        })
    }
}

impl RawPanel {
    /// Create a panel from rows (for testing and synthetic data)
    pub fn new(schema: PanelSchema, rows: Vec<PanelRow>) -> Self {
        let years: BTreeSet<i32> = rows
            .iter()
            .flat_map(|row| row.values.keys().copied())
            .collect();

        Self {
            schema,
            years: years.into_iter().collect(),
            rows,
        }
    }

    pub fn schema(&self) -> &PanelSchema {
        &self.schema
    }

    /// Year columns in ascending order
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct countries in order of first appearance
    pub fn countries(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .filter(|row| seen.insert(row.country.clone()))
            .map(|row| row.country.clone())
            .collect()
    }

    /// Whether any row carries the indicator
    pub fn has_indicator(&self, name: &str) -> bool {
        self.rows.iter().any(|row| row.matches_indicator(name))
    }

    /// Rows carrying the indicator, in panel order
    pub fn rows_for_indicator<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a PanelRow> {
        self.rows.iter().filter(move |row| row.matches_indicator(name))
    }

    /// Keep only the given countries; an empty list keeps everything
    pub fn filter_countries(&self, countries: &[String]) -> Result<RawPanel> {
        if countries.is_empty() {
            return Ok(self.clone());
        }

        let rows: Vec<PanelRow> = self
            .rows
            .iter()
            .filter(|row| countries.contains(&row.country))
            .cloned()
            .collect();

        if rows.is_empty() {
            return Err(ForecastError::DataError(format!(
                "none of the countries [{}] occur in the panel",
                countries.join(", ")
            )));
        }

        let present = self.countries();
        for country in countries.iter().filter(|c| !present.contains(*c)) {
            warn!(country = %country, "target country not present in the panel");
        }

        Ok(RawPanel {
            schema: self.schema.clone(),
            years: self.years.clone(),
            rows,
        })
    }

    /// Convert back to a wide DataFrame with the schema's column names
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Series::new(
                &self.schema.country_column,
                self.rows.iter().map(|r| r.country.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                &self.schema.indicator_column,
                self.rows.iter().map(|r| r.indicator.clone()).collect::<Vec<_>>(),
            ),
        ];

        if let Some(alt) = &self.schema.alt_indicator_column {
            if self.rows.iter().any(|r| r.alt_indicator.is_some()) {
                columns.push(Series::new(
                    alt,
                    self.rows
                        .iter()
                        .map(|r| r.alt_indicator.clone())
                        .collect::<Vec<Option<String>>>(),
                ));
            }
        }

        for year in &self.years {
            let values: Vec<Option<f64>> = self
                .rows
                .iter()
                .map(|r| r.values.get(year).copied().flatten())
                .collect();
            columns.push(Series::new(&year.to_string(), values));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Write the panel as CSV in its wide layout
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut df = self.to_dataframe()?;
        crate::artifacts::write_atomically(path.as_ref(), |file| {
            CsvWriter::new(file).has_header(true).finish(&mut df)?;
            Ok(())
        })
    }
}

/// A year column is named by exactly four ASCII digits
fn is_year_column(name: &str) -> bool {
    name.len() == 4 && name.bytes().all(|b| b.is_ascii_digit())
}

fn utf8_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?.cast(&DataType::Utf8)?;
    let values = series
        .utf8()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    let values = series
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| v.is_finite()))
        .collect();
    Ok(values)
}
