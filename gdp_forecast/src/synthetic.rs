//! Seeded synthetic panels for demos and tests
//!
//! The generated panel has the wide layout of the real indicator data: one row
//! per (country, indicator), one column per year. Growth depends linearly on
//! the regressor indicators plus Gaussian noise. Interior gaps and a leading
//! KPI gap are injected so that cleaning has work to do.

use crate::config::PipelineConfig;
use crate::data::{PanelRow, RawPanel};
use crate::error::{ForecastError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Indicator present in the panel but never used by the pipeline
pub const DISTRACTOR_INDICATOR: &str = "Population, total (millions)";

/// Country present in the panel but outside the default target list
pub const EXTRA_COUNTRY: &str = "Ghana";

/// Parameters of the synthetic panel
#[derive(Debug, Clone)]
pub struct SyntheticPanel {
    pub first_year: i32,
    pub last_year: i32,
    pub seed: u64,
    /// Standard deviation of the growth noise
    pub noise_sd: f64,
    /// Probability that an interior cell is left empty
    pub gap_rate: f64,
}

impl Default for SyntheticPanel {
    fn default() -> Self {
        Self {
            first_year: 1995,
            last_year: 2020,
            seed: 42,
            noise_sd: 0.8,
            gap_rate: 0.05,
        }
    }
}

impl SyntheticPanel {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Generate a panel carrying the configured KPI and regressors
    pub fn generate(&self, config: &PipelineConfig) -> Result<RawPanel> {
        if self.last_year - self.first_year < 3 {
            return Err(ForecastError::InvalidParameter(
                "synthetic panel needs at least four years".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.gap_rate) {
            return Err(ForecastError::InvalidParameter(
                "gap rate must be in [0, 1)".to_string(),
            ));
        }

        let noise = normal(0.0, self.noise_sd)?;
        let shock = normal(0.0, 1.0)?;

        let mut countries = config.countries.clone();
        if !countries.iter().any(|c| c == EXTRA_COUNTRY) {
            countries.push(EXTRA_COUNTRY.to_string());
        }

        let years: Vec<i32> = (self.first_year..=self.last_year).collect();
        let mut rows = Vec::new();

        for (index, country) in countries.iter().enumerate() {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(index as u64));
            let base_growth = 2.0 + rng.gen::<f64>() * 3.0;

            // Each regressor follows an AR(1) walk around its own level
            let mut regressors: Vec<Vec<f64>> = Vec::with_capacity(config.regressors.len());
            for r in 0..config.regressors.len() {
                let level = -4.0 + 6.0 * r as f64 + rng.gen::<f64>() * 2.0;
                let mut value = level;
                let mut series = Vec::with_capacity(years.len());
                for _ in &years {
                    value = level + 0.6 * (value - level) + shock.sample(&mut rng);
                    series.push(value);
                }
                regressors.push(series);
            }

            let weights: Vec<f64> = (0..config.regressors.len())
                .map(|r| if r % 2 == 0 { 0.3 } else { -0.2 })
                .collect();
            let growth: Vec<f64> = (0..years.len())
                .map(|i| {
                    let effect: f64 = regressors
                        .iter()
                        .zip(&weights)
                        .map(|(series, w)| w * (series[i] - series[0]))
                        .sum();
                    base_growth + effect + noise.sample(&mut rng)
                })
                .collect();

            // Every other country starts with an unreported KPI year
            let leading_gap = index % 2 == 1;
            let kpi_values = self.with_gaps(&years, &growth, leading_gap, &mut rng);
            rows.push(PanelRow::new(country, &config.target_kpi, &kpi_values));

            for (spec, series) in config.regressors.iter().zip(&regressors) {
                let values = self.with_gaps(&years, series, false, &mut rng);
                rows.push(PanelRow::new(country, &spec.indicator, &values));
            }

            let population: Vec<(i32, Option<f64>)> = years
                .iter()
                .enumerate()
                .map(|(i, year)| (*year, Some(20.0 + index as f64 * 15.0 + i as f64 * 0.6)))
                .collect();
            rows.push(PanelRow::new(country, DISTRACTOR_INDICATOR, &population));
        }

        Ok(RawPanel::new(config.schema.clone(), rows))
    }

    /// Blank random interior cells; the first and last year stay known
    fn with_gaps(
        &self,
        years: &[i32],
        values: &[f64],
        leading_gap: bool,
        rng: &mut StdRng,
    ) -> Vec<(i32, Option<f64>)> {
        let last = years.len() - 1;
        years
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (year, value))| {
                let blank = if i == 0 {
                    leading_gap
                } else if i == 1 || i == last {
                    false
                } else {
                    rng.gen::<f64>() < self.gap_rate
                };
                (*year, if blank { None } else { Some(*value) })
            })
            .collect()
    }
}

fn normal(mean: f64, sd: f64) -> Result<Normal<f64>> {
    Normal::new(mean, sd).map_err(|e| ForecastError::InvalidParameter(e.to_string()))
}
