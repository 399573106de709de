use gdp_forecast::config::{PipelineConfig, RegressorSpec, SplitConfig};
use gdp_forecast::error::ForecastError;
use gdp_forecast::models::projection::ProjectionStrategy;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = PipelineConfig::default();

    assert_eq!(config.target_kpi, "Real GDP growth (annual %)");
    assert_eq!(config.countries, vec!["Kenya", "South Africa", "Nigeria"]);
    assert_eq!(
        config.regressor_columns(),
        vec!["Fiscal_Balance", "Current_Account_Balance", "Inflation"]
    );
    assert_eq!(config.split.train_end, 2015);
    assert_eq!(config.split.test_start, 2016);
    assert_eq!(config.horizon_years, 5);
    assert_eq!(config.projection, ProjectionStrategy::LastObserved);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_keeps_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{
            "countries": ["Ghana"],
            "horizon_years": 3,
            "split": {{ "train_end": 2012, "test_start": 2013 }},
            "projection": {{ "kind": "trailing_mean", "window": 3 }}
        }}"#
    )
    .unwrap();

    let config = PipelineConfig::from_json_file(file.path()).unwrap();

    assert_eq!(config.countries, vec!["Ghana"]);
    assert_eq!(config.horizon_years, 3);
    assert_eq!(config.split.train_end, 2012);
    assert_eq!(config.split.test_end, 2020);
    assert_eq!(config.projection, ProjectionStrategy::TrailingMean { window: 3 });
    assert_eq!(config.target_kpi, PipelineConfig::default().target_kpi);
    assert_eq!(config.artifacts.bundle, "forecasting_results.json");
}

#[test]
fn test_invalid_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{{ \"horizon_years\": \"five\" }}").unwrap();

    assert!(matches!(
        PipelineConfig::from_json_file(file.path()),
        Err(ForecastError::JsonError(_))
    ));
}

#[rstest]
#[case(2016, 2016, 2020)]
#[case(2017, 2016, 2020)]
#[case(2015, 2018, 2017)]
fn test_invalid_split(#[case] train_end: i32, #[case] test_start: i32, #[case] test_end: i32) {
    let split = SplitConfig {
        train_end,
        test_start,
        test_end,
    };
    assert!(matches!(split.validate(), Err(ForecastError::InvalidParameter(_))));
}

#[test]
fn test_regressor_columns_must_be_unique() {
    let mut config = PipelineConfig::default();
    config
        .regressors
        .push(RegressorSpec::new("Another inflation measure", "Inflation"));

    assert!(matches!(config.validate(), Err(ForecastError::InvalidParameter(_))));
}

#[rstest]
#[case("y")]
#[case("ds")]
#[case("Regressors_Effect")]
fn test_reserved_column_names(#[case] column: &str) {
    let mut config = PipelineConfig::default();
    config.regressors[0].column = column.to_string();

    assert!(config.validate().is_err());
}

#[test]
fn test_zero_horizon_is_invalid() {
    let config = PipelineConfig {
        horizon_years: 0,
        ..PipelineConfig::default()
    };
    assert!(config.validate().is_err());
}
