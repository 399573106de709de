//! End-to-end orchestration
//!
//! Stages run in a fixed order: filter countries, clean the KPI, drop leading
//! gaps, merge regressors, split by year, then fit/predict/evaluate/attribute
//! per country. Schema and KPI lookup errors fail the run. A country whose
//! series cannot be interpolated, or whose model stage fails, is recorded and
//! skipped while the others continue.

use crate::artifacts;
use crate::attribution::FeatureAttributor;
use crate::bundle::ResultBundle;
use crate::cleaning::{CleanedPanel, PanelCleaner};
use crate::config::PipelineConfig;
use crate::data::RawPanel;
use crate::error::{ForecastError, Result};
use crate::features::{country_datasets, CountryDataset, FeatureMerger, MergedPanel};
use crate::insights;
use crate::metrics::evaluate_forecast;
use crate::models::additive::AdditiveModel;
use crate::models::projection::RegressorProjection;
use crate::models::{FittedForecastModel, ForecastModel, Prediction, RegressorFrame, TrainingFrame};
use crate::records::{ComponentRecord, ForecastRecord, ImportanceRecord, MetricRecord, Segment};
use crate::utils::future_years;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Outputs of the data stages
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Raw panel restricted to the target countries
    pub filtered: RawPanel,
    /// Interpolated KPI series, leading gaps still missing
    pub cleaned: CleanedPanel,
    /// Cleaned series without the leading gaps
    pub observed: CleanedPanel,
    pub merged: MergedPanel,
    pub train: MergedPanel,
    pub test: MergedPanel,
    /// Countries left out by the cleaner or the merger, with the reason
    pub excluded: BTreeMap<String, String>,
}

impl PreparedData {
    pub fn datasets(&self) -> BTreeMap<String, CountryDataset> {
        country_datasets(&self.train, &self.test)
    }
}

/// Everything produced for one country
#[derive(Debug, Clone, PartialEq)]
pub struct CountryForecast {
    pub country: String,
    pub forecasts: Vec<ForecastRecord>,
    pub metrics: MetricRecord,
    pub components: Vec<ComponentRecord>,
    /// Observed KPI values of the test window
    pub test_actuals: Vec<f64>,
}

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub prepared: PreparedData,
    pub bundle: ResultBundle,
    pub importance: Vec<ImportanceRecord>,
    pub test_actuals: BTreeMap<String, Vec<f64>>,
    /// Countries excluded during preparation or whose model stage failed, with the reason
    pub failures: BTreeMap<String, String>,
}

/// Forecasting pipeline over a raw indicator panel
#[derive(Debug, Clone)]
pub struct Pipeline<M: ForecastModel = AdditiveModel> {
    config: PipelineConfig,
    model: M,
}

impl Pipeline<AdditiveModel> {
    /// Pipeline using the additive model configured in `config`
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let model = AdditiveModel::new(config.model.clone())?;
        Ok(Self { config, model })
    }
}

impl<M: ForecastModel> Pipeline<M> {
    /// Pipeline using a caller-supplied model
    pub fn with_model(config: PipelineConfig, model: M) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, model })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run every data stage up to the train/test split
    pub fn prepare(&self, panel: &RawPanel) -> Result<PreparedData> {
        let filtered = panel.filter_countries(&self.config.countries)?;
        info!(rows = filtered.len(), "filtered panel to target countries");

        let cleaned = PanelCleaner::new(&self.config.target_kpi).clean(&filtered)?;
        let observed = cleaned.drop_missing();
        if observed.len() < cleaned.len() {
            info!(
                dropped = cleaned.len() - observed.len(),
                "dropped leading KPI gaps"
            );
        }

        let merged = FeatureMerger::new(self.config.regressors.clone()).merge(&observed, &filtered)?;
        let (train, test) = merged.split(&self.config.split);
        info!(
            train = train.len(),
            test = test.len(),
            train_end = self.config.split.train_end,
            test_start = self.config.split.test_start,
            "split panel"
        );

        let mut excluded = cleaned.excluded().clone();
        excluded.extend(merged.excluded().clone());

        Ok(PreparedData {
            filtered,
            cleaned,
            observed,
            merged,
            train,
            test,
            excluded,
        })
    }

    /// Fit on train, predict test and future years, evaluate and decompose
    pub fn forecast_country(&self, dataset: &CountryDataset) -> Result<CountryForecast> {
        let country = dataset.country.as_str();
        let regressors = dataset.regressors.as_slice();

        if dataset.test.is_empty() {
            return Err(ForecastError::ValidationError(format!(
                "{} has no observations in the test window",
                country
            )));
        }

        let fitted = self
            .model
            .fit(&TrainingFrame::from_rows(regressors, &dataset.train)?)?;

        let test_prediction = fitted.predict(&RegressorFrame::from_rows(regressors, &dataset.test)?)?;

        let future = future_years(self.config.split.test_end, self.config.horizon_years)?;
        let history: Vec<_> = dataset.history().cloned().collect();
        let future_frame = self.config.projection.project(regressors, &history, &future)?;
        let future_prediction = fitted.predict(&future_frame)?;

        let mut forecasts = Vec::with_capacity(
            dataset.train.len() + 2 * dataset.test.len() + future_prediction.len(),
        );
        forecasts.extend(
            dataset
                .train
                .iter()
                .map(|r| ForecastRecord::historical(country, r.ds, r.y, Segment::HistoricalTrain)),
        );
        forecasts.extend(
            dataset
                .test
                .iter()
                .map(|r| ForecastRecord::historical(country, r.ds, r.y, Segment::HistoricalTest)),
        );
        forecasts.extend(forecast_records(country, &test_prediction, Segment::ForecastTest));
        forecasts.extend(forecast_records(country, &future_prediction, Segment::ForecastFuture));

        let actual: Vec<_> = dataset.test.iter().map(|r| (r.ds, r.y)).collect();
        let predicted: Vec<_> = test_prediction.rows.iter().map(|r| (r.ds, r.yhat)).collect();
        let metrics = evaluate_forecast(country, &actual, &predicted)?;

        let components = component_records(country, &test_prediction);

        info!(
            country,
            model = fitted.name(),
            rmse = metrics.rmse,
            mae = metrics.mae,
            mape = metrics.mape,
            "forecast country"
        );

        Ok(CountryForecast {
            country: country.to_string(),
            forecasts,
            metrics,
            components,
            test_actuals: dataset.test.iter().map(|r| r.y).collect(),
        })
    }

    /// Forecast every country of the prepared data, recording failures
    pub fn forecast_all(
        &self,
        prepared: &PreparedData,
    ) -> (Vec<CountryForecast>, BTreeMap<String, String>) {
        let mut results = Vec::new();
        let mut failures = BTreeMap::new();

        for (country, dataset) in prepared.datasets() {
            match self.forecast_country(&dataset) {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!(country = %country, error = %err, "country forecast failed");
                    failures.insert(country, err.to_string());
                }
            }
        }

        (results, failures)
    }

    /// Run the whole pipeline in memory
    pub fn run(&self, panel: &RawPanel) -> Result<PipelineOutput> {
        let prepared = self.prepare(panel)?;
        let (results, model_failures) = self.forecast_all(&prepared);

        let mut failures = prepared.excluded.clone();
        failures.extend(model_failures);

        if results.is_empty() {
            return Err(ForecastError::ForecastingError(format!(
                "no country could be forecast ({} failed)",
                failures.len()
            )));
        }

        let mut bundle = ResultBundle::new();
        let mut test_actuals = BTreeMap::new();
        for result in results {
            test_actuals.insert(result.country.clone(), result.test_actuals);
            bundle.insert(&result.country, result.forecasts, result.metrics, result.components);
        }

        let importance = FeatureAttributor::new(self.config.regressor_columns())
            .attribute_all(&bundle.components)?;

        Ok(PipelineOutput {
            prepared,
            bundle,
            importance,
            test_actuals,
            failures,
        })
    }

    /// Run the pipeline and write every artifact into `out_dir`
    pub fn run_to_dir(&self, panel: &RawPanel, out_dir: &Path) -> Result<PipelineOutput> {
        let output = self.run(panel)?;
        self.write_artifacts(&output, out_dir)?;
        Ok(output)
    }

    /// Write the stage outputs, bundle, importance and reports
    pub fn write_artifacts(&self, output: &PipelineOutput, out_dir: &Path) -> Result<()> {
        let names = &self.config.artifacts;
        let prepared = &output.prepared;

        prepared.filtered.write_csv(out_dir.join(&names.filtered_panel))?;
        artifacts::write_observations(&out_dir.join(&names.clean_series), &prepared.cleaned)?;
        artifacts::write_merged(&out_dir.join(&names.merged_series), &prepared.merged)?;
        artifacts::write_merged(&out_dir.join(&names.train), &prepared.train)?;
        artifacts::write_merged(&out_dir.join(&names.test), &prepared.test)?;
        output.bundle.save(out_dir.join(&names.bundle))?;
        artifacts::write_importance(&out_dir.join(&names.importance), &output.importance)?;

        artifacts::write_text(
            &out_dir.join(&names.eda_insights),
            &insights::eda_report(&self.config.target_kpi, &prepared.observed),
        )?;
        artifacts::write_text(
            &out_dir.join(&names.model_insights),
            &insights::model_report(&output.bundle.metrics, &output.test_actuals, &output.failures),
        )?;

        info!(dir = %out_dir.display(), "wrote artifacts");
        Ok(())
    }
}

fn forecast_records(country: &str, prediction: &Prediction, segment: Segment) -> Vec<ForecastRecord> {
    prediction
        .rows
        .iter()
        .map(|r| ForecastRecord::forecast(country, r.ds, r.yhat, r.yhat_lower, r.yhat_upper, segment))
        .collect()
}

fn component_records(country: &str, prediction: &Prediction) -> Vec<ComponentRecord> {
    prediction
        .rows
        .iter()
        .map(|r| ComponentRecord {
            country: country.to_string(),
            ds: r.ds,
            trend: r.trend,
            seasonality: r.seasonal,
            effects: prediction
                .regressors
                .iter()
                .cloned()
                .zip(r.effects.iter().copied())
                .collect(),
            regressors_effect: r.regressors_effect(),
        })
        .collect()
}
