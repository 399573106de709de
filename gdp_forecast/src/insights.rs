//! Plain-text reports on the cleaned data and on model accuracy

use crate::cleaning::CleanedPanel;
use crate::metrics::NEAR_ZERO_ACTUAL;
use crate::records::MetricRecord;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt;

/// Mean, sample standard deviation, min and max of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStats {
    /// Summarize a series; `None` when it is empty
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            count: values.len(),
            mean: values.iter().copied().mean(),
            std_dev: values.iter().copied().std_dev(),
            min: Statistics::min(values),
            max: Statistics::max(values),
        })
    }
}

/// Level and year-over-year change statistics of one country
#[derive(Debug, Clone, PartialEq)]
pub struct CountrySummary {
    pub country: String,
    pub level: SummaryStats,
    /// `None` when the series has a single year
    pub change: Option<SummaryStats>,
}

/// Summaries per country, computed on known values only
pub fn summarize(panel: &CleanedPanel) -> Vec<CountrySummary> {
    panel
        .countries()
        .into_iter()
        .filter_map(|country| {
            let values: Vec<f64> = panel.series(&country).filter_map(|o| o.value).collect();
            let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
            let level = SummaryStats::of(&values)?;
            Some(CountrySummary {
                country,
                level,
                change: SummaryStats::of(&changes),
            })
        })
        .collect()
}

fn stats_table(f: &mut fmt::Formatter<'_>, rows: &[(&str, Option<SummaryStats>)]) -> fmt::Result {
    writeln!(f, "| Country | Years | Mean | Std | Min | Max |")?;
    writeln!(f, "|---|---|---|---|---|---|")?;
    for (country, stats) in rows {
        match stats {
            Some(s) => writeln!(
                f,
                "| {} | {} | {:.2} | {:.2} | {:.2} | {:.2} |",
                country, s.count, s.mean, s.std_dev, s.min, s.max
            )?,
            None => writeln!(f, "| {} | 0 | - | - | - | - |", country)?,
        }
    }
    Ok(())
}

/// Exploratory report on the cleaned KPI series
pub struct EdaReport<'a> {
    kpi: &'a str,
    summaries: Vec<CountrySummary>,
}

impl<'a> EdaReport<'a> {
    pub fn new(kpi: &'a str, panel: &CleanedPanel) -> Self {
        Self {
            kpi,
            summaries: summarize(panel),
        }
    }
}

impl fmt::Display for EdaReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Exploratory analysis: {}", self.kpi)?;
        writeln!(f)?;

        if self.summaries.is_empty() {
            return writeln!(f, "No observations available.");
        }

        writeln!(f, "## Level")?;
        writeln!(f)?;
        let levels: Vec<(&str, Option<SummaryStats>)> = self
            .summaries
            .iter()
            .map(|s| (s.country.as_str(), Some(s.level)))
            .collect();
        stats_table(f, &levels)?;
        writeln!(f)?;

        writeln!(f, "## Year-over-year change")?;
        writeln!(f)?;
        let changes: Vec<(&str, Option<SummaryStats>)> = self
            .summaries
            .iter()
            .map(|s| (s.country.as_str(), s.change))
            .collect();
        stats_table(f, &changes)?;
        writeln!(f)?;

        writeln!(f, "## Observations")?;
        writeln!(f)?;

        let by_mean = |a: &&CountrySummary, b: &&CountrySummary| a.level.mean.total_cmp(&b.level.mean);
        if let Some(highest) = self.summaries.iter().max_by(by_mean) {
            writeln!(
                f,
                "- {} has the highest average growth at {:.2}%.",
                highest.country, highest.level.mean
            )?;
        }
        if let Some(lowest) = self.summaries.iter().min_by(by_mean) {
            writeln!(
                f,
                "- {} has the lowest average growth at {:.2}%.",
                lowest.country, lowest.level.mean
            )?;
        }
        if let Some(volatile) = self
            .summaries
            .iter()
            .filter(|s| s.level.std_dev.is_finite())
            .max_by(|a, b| a.level.std_dev.total_cmp(&b.level.std_dev))
        {
            writeln!(
                f,
                "- {} is the most volatile, with a standard deviation of {:.2} points.",
                volatile.country, volatile.level.std_dev
            )?;
        }
        Ok(())
    }
}

/// Render the exploratory report
pub fn eda_report(kpi: &str, panel: &CleanedPanel) -> String {
    EdaReport::new(kpi, panel).to_string()
}

/// Accuracy report over the evaluated countries.
///
/// `test_actuals` holds each country's test-window actuals; countries with an
/// actual below [`NEAR_ZERO_ACTUAL`] in magnitude are listed as having an
/// inflated MAPE.
pub struct ModelReport<'a> {
    pub metrics: &'a BTreeMap<String, MetricRecord>,
    pub test_actuals: &'a BTreeMap<String, Vec<f64>>,
    pub failures: &'a BTreeMap<String, String>,
}

impl fmt::Display for ModelReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Model evaluation")?;
        writeln!(f)?;
        writeln!(f, "| Country | RMSE | MAE | MAPE (%) |")?;
        writeln!(f, "|---|---|---|---|")?;
        for record in self.metrics.values() {
            writeln!(
                f,
                "| {} | {:.4} | {:.4} | {:.2} |",
                record.country, record.rmse, record.mae, record.mape
            )?;
        }
        writeln!(f)?;

        let by_rmse = |a: &&MetricRecord, b: &&MetricRecord| a.rmse.total_cmp(&b.rmse);
        let finite: Vec<&MetricRecord> = self.metrics.values().filter(|m| m.rmse.is_finite()).collect();
        if let (Some(best), Some(worst)) = (
            finite.iter().copied().min_by(by_rmse),
            finite.iter().copied().max_by(by_rmse),
        ) {
            writeln!(f, "- Most accurate: {} (RMSE {:.4}).", best.country, best.rmse)?;
            writeln!(f, "- Least accurate: {} (RMSE {:.4}).", worst.country, worst.rmse)?;
        }

        let inflated: Vec<&str> = self
            .test_actuals
            .iter()
            .filter(|(_, actuals)| actuals.iter().any(|a| a.abs() < NEAR_ZERO_ACTUAL))
            .map(|(country, _)| country.as_str())
            .collect();
        if !inflated.is_empty() {
            writeln!(f)?;
            writeln!(f, "## MAPE caveat")?;
            writeln!(f)?;
            writeln!(
                f,
                "MAPE divides by the actual value. The test window of {} contains growth \
                 below {:.1}% in magnitude, so its MAPE is inflated; compare on RMSE and MAE.",
                inflated.join(", "),
                NEAR_ZERO_ACTUAL
            )?;
        }

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Failed countries")?;
            writeln!(f)?;
            for (country, reason) in self.failures {
                writeln!(f, "- {}: {}", country, reason)?;
            }
        }
        Ok(())
    }
}

/// Render the accuracy report
pub fn model_report(
    metrics: &BTreeMap<String, MetricRecord>,
    test_actuals: &BTreeMap<String, Vec<f64>>,
    failures: &BTreeMap<String, String>,
) -> String {
    ModelReport {
        metrics,
        test_actuals,
        failures,
    }
    .to_string()
}
