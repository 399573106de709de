//! Feature importance from the additive decomposition
//!
//! Importance is the mean absolute additive effect of a feature over the test
//! window. Values are not normalized; they rank features within a country.

use crate::error::{ForecastError, Result};
use crate::records::{ComponentRecord, ImportanceRecord};

pub const TREND_FEATURE: &str = "Trend";
pub const SEASONALITY_FEATURE: &str = "Seasonality";

/// Derives importance records from component records
#[derive(Debug, Clone)]
pub struct FeatureAttributor {
    regressors: Vec<String>,
}

impl FeatureAttributor {
    pub fn new(regressors: Vec<String>) -> Self {
        Self { regressors }
    }

    /// Feature names in output order: regressors, trend, seasonality
    pub fn features(&self) -> Vec<String> {
        let mut features = self.regressors.clone();
        features.push(TREND_FEATURE.to_string());
        features.push(SEASONALITY_FEATURE.to_string());
        features
    }

    /// One record per feature for a single country's components
    pub fn attribute(&self, country: &str, components: &[ComponentRecord]) -> Result<Vec<ImportanceRecord>> {
        if components.is_empty() {
            return Err(ForecastError::DataError(format!(
                "No component records for {}",
                country
            )));
        }

        let mut records = Vec::with_capacity(self.regressors.len() + 2);

        for regressor in &self.regressors {
            let effects = components
                .iter()
                .map(|c| {
                    c.effects.get(regressor).copied().ok_or_else(|| {
                        ForecastError::DataError(format!(
                            "Component record for {} at {} lacks regressor '{}'",
                            country, c.ds, regressor
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            records.push(importance(country, regressor, &effects));
        }

        let trend: Vec<f64> = components.iter().map(|c| c.trend).collect();
        records.push(importance(country, TREND_FEATURE, &trend));

        let seasonality: Vec<f64> = components.iter().map(|c| c.seasonality).collect();
        records.push(importance(country, SEASONALITY_FEATURE, &seasonality));

        Ok(records)
    }

    /// Attribute every country, in the iteration order of `components`
    pub fn attribute_all<'a, I>(&self, components: I) -> Result<Vec<ImportanceRecord>>
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<ComponentRecord>)>,
    {
        let mut records = Vec::new();
        for (country, rows) in components {
            records.extend(self.attribute(country, rows)?);
        }
        Ok(records)
    }
}

fn importance(country: &str, feature: &str, effects: &[f64]) -> ImportanceRecord {
    ImportanceRecord {
        country: country.to_string(),
        feature: feature.to_string(),
        importance: effects.iter().map(|e| e.abs()).sum::<f64>() / effects.len() as f64,
    }
}
