use assert_approx_eq::assert_approx_eq;
use chrono::Datelike;
use gdp_forecast::artifacts::{read_importance, read_merged, read_observations};
use gdp_forecast::bundle::ResultBundle;
use gdp_forecast::config::PipelineConfig;
use gdp_forecast::data::{PanelRow, RawPanel};
use gdp_forecast::error::ForecastError;
use gdp_forecast::pipeline::Pipeline;
use gdp_forecast::records::Segment;
use gdp_forecast::synthetic::{SyntheticPanel, EXTRA_COUNTRY};
use pretty_assertions::assert_eq;
use std::fs;

fn synthetic(config: &PipelineConfig) -> RawPanel {
    SyntheticPanel::with_seed(7).generate(config).unwrap()
}

#[test]
fn test_end_to_end_on_synthetic_panel() {
    let config = PipelineConfig::default();
    let pipeline = Pipeline::new(config.clone()).unwrap();
    let output = pipeline.run(&synthetic(&config)).unwrap();

    assert!(output.failures.is_empty(), "{:?}", output.failures);
    assert_eq!(
        output.bundle.countries(),
        vec!["Kenya".to_string(), "Nigeria".to_string(), "South Africa".to_string()]
    );
    assert!(!output.bundle.forecasts.contains_key(EXTRA_COUNTRY));

    let datasets = output.prepared.datasets();
    for (country, records) in &output.bundle.forecasts {
        let dataset = &datasets[country];
        let count = |segment: Segment| records.iter().filter(|r| r.segment == segment).count();

        assert_eq!(count(Segment::HistoricalTrain), dataset.train.len());
        assert_eq!(count(Segment::HistoricalTest), dataset.test.len());
        assert_eq!(count(Segment::ForecastTest), dataset.test.len());
        assert_eq!(count(Segment::ForecastFuture), config.horizon_years);
        assert_eq!(
            records.len(),
            dataset.train.len() + 2 * dataset.test.len() + config.horizon_years
        );
    }
}

#[test]
fn test_forecast_bounds_and_components() {
    let config = PipelineConfig::default();
    let output = Pipeline::new(config.clone())
        .unwrap()
        .run(&synthetic(&config))
        .unwrap();

    for (country, records) in &output.bundle.forecasts {
        for record in records.iter().filter(|r| r.segment.is_forecast()) {
            assert!(record.lower <= record.value, "{:?}", record);
            assert!(record.value <= record.upper, "{:?}", record);
        }
        for record in records.iter().filter(|r| !r.segment.is_forecast()) {
            assert_eq!(record.lower, record.value);
            assert_eq!(record.upper, record.value);
        }

        let components = &output.bundle.components[country];
        let test_forecasts: Vec<_> = records
            .iter()
            .filter(|r| r.segment == Segment::ForecastTest)
            .collect();
        assert_eq!(components.len(), test_forecasts.len());

        for (component, forecast) in components.iter().zip(test_forecasts) {
            assert_eq!(component.ds, forecast.ds);
            assert_approx_eq!(component.total(), forecast.value, 1e-6);
            assert_approx_eq!(
                component.regressors_effect,
                component.effects.values().sum::<f64>(),
                1e-9
            );
        }
    }
}

#[test]
fn test_split_boundary_and_future_years() {
    let config = PipelineConfig::default();
    let output = Pipeline::new(config.clone())
        .unwrap()
        .run(&synthetic(&config))
        .unwrap();

    assert!(output.prepared.train.rows().iter().all(|r| r.year() <= 2015));
    assert!(output
        .prepared
        .test
        .rows()
        .iter()
        .all(|r| (2016..=2020).contains(&r.year())));

    let kenya = output.bundle.forecasts_for("Kenya").unwrap();
    let future: Vec<i32> = kenya
        .iter()
        .filter(|r| r.segment == Segment::ForecastFuture)
        .map(|r| r.ds.year())
        .collect();
    assert_eq!(future, vec![2021, 2022, 2023, 2024, 2025]);
}

#[test]
fn test_importance_rows_per_country() {
    let config = PipelineConfig::default();
    let output = Pipeline::new(config.clone())
        .unwrap()
        .run(&synthetic(&config))
        .unwrap();

    assert_eq!(output.importance.len(), 3 * (config.regressors.len() + 2));
    for country in output.bundle.countries() {
        let rows: Vec<_> = output
            .importance
            .iter()
            .filter(|r| r.country == country)
            .collect();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.importance >= 0.0));
    }
}

#[test]
fn test_failed_country_does_not_stop_others() {
    let config = PipelineConfig {
        model: gdp_forecast::models::additive::AdditiveConfig {
            min_train_points: 8,
            ..Default::default()
        },
        ..PipelineConfig::default()
    };
    let panel = synthetic(&config);

    // Nigeria keeps only four training years
    let rows: Vec<PanelRow> = panel
        .rows()
        .iter()
        .cloned()
        .map(|mut row| {
            if row.country == "Nigeria" && row.indicator == config.target_kpi {
                for (year, value) in row.values.iter_mut() {
                    if *year < 2012 {
                        *value = None;
                    }
                }
            }
            row
        })
        .collect();
    let panel = RawPanel::new(panel.schema().clone(), rows);

    let output = Pipeline::new(config).unwrap().run(&panel).unwrap();

    assert!(output.failures.contains_key("Nigeria"));
    assert_eq!(
        output.bundle.countries(),
        vec!["Kenya".to_string(), "South Africa".to_string()]
    );
}

/// Blank one indicator for one country, keeping only the given years
fn blank_except(panel: &RawPanel, country: &str, indicator: &str, keep: &[i32]) -> RawPanel {
    let rows: Vec<PanelRow> = panel
        .rows()
        .iter()
        .cloned()
        .map(|mut row| {
            if row.country == country && row.indicator == indicator {
                for (year, value) in row.values.iter_mut() {
                    if !keep.contains(year) {
                        *value = None;
                    }
                }
            }
            row
        })
        .collect();
    RawPanel::new(panel.schema().clone(), rows)
}

#[test]
fn test_sparse_regressor_fails_only_that_country() {
    let config = PipelineConfig::default();
    let inflation = config
        .regressors
        .iter()
        .find(|r| r.column == "Inflation")
        .unwrap()
        .indicator
        .clone();
    let panel = blank_except(&synthetic(&config), "Nigeria", &inflation, &[2010]);

    let dir = tempfile::tempdir().unwrap();
    let output = Pipeline::new(config.clone())
        .unwrap()
        .run_to_dir(&panel, dir.path())
        .unwrap();

    assert_eq!(
        output.bundle.countries(),
        vec!["Kenya".to_string(), "South Africa".to_string()]
    );
    assert!(output.failures["Nigeria"].contains("Inflation"));
    assert!(output.prepared.excluded.contains_key("Nigeria"));
    assert!(output.prepared.merged.rows().iter().all(|r| r.country != "Nigeria"));
    assert!(output.importance.iter().all(|r| r.country != "Nigeria"));

    let report = fs::read_to_string(dir.path().join(&config.artifacts.model_insights)).unwrap();
    assert!(report.contains("Failed countries"));
    assert!(report.contains("Nigeria"));
}

#[test]
fn test_sparse_kpi_fails_only_that_country() {
    let config = PipelineConfig::default();
    let panel = blank_except(&synthetic(&config), "Nigeria", &config.target_kpi, &[2010]);

    let output = Pipeline::new(config).unwrap().run(&panel).unwrap();

    assert!(output.failures.contains_key("Nigeria"));
    assert!(output.prepared.cleaned.series("Nigeria").next().is_none());
    assert_eq!(
        output.bundle.countries(),
        vec!["Kenya".to_string(), "South Africa".to_string()]
    );
}

#[test]
fn test_missing_kpi_fails_the_run() {
    let config = PipelineConfig {
        target_kpi: "Unemployment rate (%)".to_string(),
        ..PipelineConfig::default()
    };
    let result = Pipeline::new(config.clone())
        .unwrap()
        .run(&synthetic(&PipelineConfig::default()));

    assert!(matches!(result, Err(ForecastError::KpiNotFound(_))));
}

#[test]
fn test_run_to_dir_writes_artifacts() {
    let config = PipelineConfig::default();
    let pipeline = Pipeline::new(config.clone()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let output = pipeline.run_to_dir(&synthetic(&config), dir.path()).unwrap();
    let names = &config.artifacts;

    for name in [
        &names.filtered_panel,
        &names.clean_series,
        &names.merged_series,
        &names.train,
        &names.test,
        &names.bundle,
        &names.importance,
        &names.eda_insights,
        &names.model_insights,
    ] {
        assert!(dir.path().join(name).exists(), "missing {}", name);
    }

    let bundle = ResultBundle::load(dir.path().join(&names.bundle)).unwrap();
    assert_eq!(bundle, output.bundle);

    let cleaned = read_observations(&dir.path().join(&names.clean_series)).unwrap();
    assert_eq!(cleaned, output.prepared.cleaned);

    let train = read_merged(&dir.path().join(&names.train)).unwrap();
    assert_eq!(train.len(), output.prepared.train.len());
    assert_eq!(train.regressors(), output.prepared.train.regressors());

    let importance = read_importance(&dir.path().join(&names.importance)).unwrap();
    assert_eq!(importance, output.importance);

    let report = fs::read_to_string(dir.path().join(&names.model_insights)).unwrap();
    assert!(report.contains("RMSE"));
    assert!(report.contains("Kenya"));
}

#[test]
fn test_runs_are_deterministic() {
    let config = PipelineConfig::default();
    let pipeline = Pipeline::new(config.clone()).unwrap();

    let first = pipeline.run(&synthetic(&config)).unwrap();
    let second = pipeline.run(&synthetic(&config)).unwrap();
    assert_eq!(first.bundle, second.bundle);
}
