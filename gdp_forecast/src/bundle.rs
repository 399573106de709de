//! The persisted result bundle
//!
//! One JSON document holds every country's forecast timeline, test metrics and
//! test-window components. Loading validates the whole document; a partially
//! readable bundle is an error.

use crate::artifacts::write_atomically;
use crate::error::{ForecastError, Result};
use crate::records::{ComponentRecord, ForecastRecord, MetricRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Per-country forecasts, metrics and components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    pub forecasts: BTreeMap<String, Vec<ForecastRecord>>,
    pub metrics: BTreeMap<String, MetricRecord>,
    pub components: BTreeMap<String, Vec<ComponentRecord>>,
}

impl ResultBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one country's results, replacing earlier ones
    pub fn insert(
        &mut self,
        country: &str,
        forecasts: Vec<ForecastRecord>,
        metrics: MetricRecord,
        components: Vec<ComponentRecord>,
    ) {
        self.forecasts.insert(country.to_string(), forecasts);
        self.metrics.insert(country.to_string(), metrics);
        self.components.insert(country.to_string(), components);
    }

    /// Countries with results, in ascending order
    pub fn countries(&self) -> Vec<String> {
        self.forecasts.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.forecasts.is_empty()
    }

    /// Forecast timeline of one country
    pub fn forecasts_for(&self, country: &str) -> Result<&[ForecastRecord]> {
        self.forecasts
            .get(country)
            .map(|records| records.as_slice())
            .ok_or_else(|| ForecastError::DataError(format!("no forecasts for {}", country)))
    }

    /// Check that all three maps cover the same countries
    pub fn validate(&self) -> Result<()> {
        let countries: Vec<&String> = self.forecasts.keys().collect();
        let metric_countries: Vec<&String> = self.metrics.keys().collect();
        let component_countries: Vec<&String> = self.components.keys().collect();

        if countries != metric_countries || countries != component_countries {
            return Err(ForecastError::ValidationError(
                "bundle sections cover different countries".to_string(),
            ));
        }

        for (country, records) in &self.forecasts {
            if let Some(record) = records.iter().find(|r| &r.country != country) {
                return Err(ForecastError::ValidationError(format!(
                    "forecast record for {} filed under {}",
                    record.country, country
                )));
            }
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let bundle: ResultBundle = serde_json::from_str(text)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Write the bundle, replacing any previous file atomically
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        write_atomically(path, |file| {
            file.write_all(json.as_bytes())?;
            Ok(())
        })?;
        info!(path = %path.display(), countries = self.forecasts.len(), "saved result bundle");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
