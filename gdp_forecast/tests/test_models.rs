use assert_approx_eq::assert_approx_eq;
use chrono::NaiveDate;
use gdp_forecast::error::ForecastError;
use gdp_forecast::features::MergedRow;
use gdp_forecast::models::additive::{AdditiveConfig, AdditiveModel};
use gdp_forecast::models::projection::{
    LastObserved, ProjectionStrategy, RegressorProjection, TrailingMean,
};
use gdp_forecast::models::{FittedForecastModel, ForecastModel, RegressorFrame, TrainingFrame};
use rstest::rstest;

fn year(y: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, 1, 1).unwrap()
}

fn names() -> Vec<String> {
    vec!["Fiscal_Balance".to_string(), "Inflation".to_string()]
}

/// Linear growth path plus a known regressor contribution
fn rows(start: i32, end: i32) -> Vec<MergedRow> {
    (start..=end)
        .map(|y| {
            let t = (y - start) as f64;
            let fiscal = ((y * 37) % 11) as f64 - 5.0;
            let inflation = 6.0 + ((y * 13) % 5) as f64;
            MergedRow {
                country: "Kenya".to_string(),
                ds: year(y),
                y: 2.0 + 0.1 * t + 0.4 * fiscal,
                values: vec![fiscal, inflation],
            }
        })
        .collect()
}

fn fitted(start: i32, end: i32) -> <AdditiveModel as ForecastModel>::Fitted {
    let frame = TrainingFrame::from_rows(&names(), &rows(start, end)).unwrap();
    AdditiveModel::default().fit(&frame).unwrap()
}

#[test]
fn test_additive_model_creation() {
    let model = AdditiveModel::new(AdditiveConfig::default()).unwrap();
    assert!(model.name().contains("Additive"));
    assert_eq!(model.config().yearly_fourier_order, 10);

    let bad = AdditiveConfig {
        interval_width: 1.5,
        ..AdditiveConfig::default()
    };
    assert!(matches!(
        AdditiveModel::new(bad),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_prediction_components_add_up() {
    let model = fitted(1995, 2015);
    let test = RegressorFrame::from_rows(&names(), &rows(2016, 2020)).unwrap();

    let prediction = model.predict(&test).unwrap();
    assert_eq!(prediction.len(), 5);
    assert_eq!(prediction.regressors, names());

    for row in &prediction.rows {
        let total = row.trend + row.seasonal + row.regressors_effect();
        assert_approx_eq!(row.yhat, total, 1e-6);
        assert_eq!(row.effects.len(), 2);
    }
}

#[test]
fn test_interval_contains_point() {
    let model = fitted(1995, 2015);
    let frame = RegressorFrame::from_rows(&names(), &rows(1995, 2030)).unwrap();

    for row in model.predict(&frame).unwrap().rows {
        assert!(row.yhat_lower <= row.yhat, "{:?}", row);
        assert!(row.yhat <= row.yhat_upper, "{:?}", row);
    }
}

#[test]
fn test_tracks_regressor_driven_series() {
    let model = fitted(1995, 2015);
    let test_rows = rows(2016, 2018);
    let prediction = model
        .predict(&RegressorFrame::from_rows(&names(), &test_rows).unwrap())
        .unwrap();

    for (row, actual) in prediction.rows.iter().zip(&test_rows) {
        assert!(
            (row.yhat - actual.y).abs() < 1.0,
            "predicted {} for actual {}",
            row.yhat,
            actual.y
        );
    }

    // Fiscal balance carries the signal; inflation is noise
    let coefficients = model.regressor_coefficients();
    assert!(coefficients[0].abs() > coefficients[1].abs());
}

#[test]
fn test_intervals_widen_beyond_training_span() {
    let model = fitted(1995, 2015);
    let frame = RegressorFrame::from_rows(&names(), &rows(2015, 2030)).unwrap();
    let prediction = model.predict(&frame).unwrap();

    let first = &prediction.rows[0];
    let last = &prediction.rows[prediction.len() - 1];
    assert!(last.yhat_upper - last.yhat_lower >= first.yhat_upper - first.yhat_lower);
}

#[rstest]
#[case(1)]
#[case(0)]
fn test_fit_requires_minimum_rows(#[case] count: usize) {
    let data: Vec<MergedRow> = rows(2014, 2015).into_iter().take(count).collect();
    let frame = TrainingFrame::from_rows(&names(), &data).unwrap();

    assert!(matches!(
        AdditiveModel::default().fit(&frame),
        Err(ForecastError::ModelFitError(_))
    ));
}

#[test]
fn test_fit_rejects_non_finite_values() {
    let mut data = rows(2000, 2010);
    data[3].values[1] = f64::NAN;
    let frame = TrainingFrame::from_rows(&names(), &data).unwrap();
    assert!(AdditiveModel::default().fit(&frame).is_err());

    let mut data = rows(2000, 2010);
    data[5].y = f64::INFINITY;
    let frame = TrainingFrame::from_rows(&names(), &data).unwrap();
    assert!(AdditiveModel::default().fit(&frame).is_err());
}

#[test]
fn test_fit_rejects_unordered_timestamps() {
    let mut data = rows(2000, 2010);
    data.swap(2, 3);
    let frame = TrainingFrame::from_rows(&names(), &data).unwrap();

    assert!(matches!(
        AdditiveModel::default().fit(&frame),
        Err(ForecastError::ModelFitError(_))
    ));
}

#[test]
fn test_predict_rejects_other_regressors() {
    let model = fitted(2000, 2015);
    let frame = RegressorFrame::new(
        vec!["Inflation".to_string()],
        vec![year(2016)],
        vec![vec![6.0]],
    )
    .unwrap();

    assert!(matches!(
        model.predict(&frame),
        Err(ForecastError::ForecastingError(_))
    ));
}

#[test]
fn test_regressor_frame_validation() {
    let result = RegressorFrame::new(names(), vec![year(2016), year(2017)], vec![vec![1.0, 2.0]]);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));

    let result = RegressorFrame::new(names(), vec![year(2016)], vec![vec![1.0]]);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
}

#[test]
fn test_last_observed_projection() {
    let history = rows(2010, 2020);
    let future = vec![year(2021), year(2022)];

    let frame = LastObserved.project(&names(), &history, &future).unwrap();
    assert_eq!(frame.len(), 2);
    assert_eq!(frame.ds(), future.as_slice());
    for values in frame.values() {
        assert_eq!(values, &history[history.len() - 1].values);
    }
}

#[test]
fn test_trailing_mean_projection() {
    let history = rows(2010, 2020);
    let future = vec![year(2021)];

    let frame = TrailingMean::new(3).unwrap().project(&names(), &history, &future).unwrap();
    let expected: f64 = history[8..].iter().map(|r| r.values[0]).sum::<f64>() / 3.0;
    assert_approx_eq!(frame.values()[0][0], expected);

    assert!(TrailingMean::new(0).is_err());
}

#[rstest]
#[case::last_observed(ProjectionStrategy::LastObserved)]
#[case::trailing_mean(ProjectionStrategy::TrailingMean { window: 3 })]
fn test_projection_rejects_mismatched_width(#[case] strategy: ProjectionStrategy) {
    let history = rows(2010, 2020);
    let mut wide = names();
    wide.push("Exchange_Rate".to_string());

    let result = strategy.project(&wide, &history, &[year(2021)]);
    assert!(matches!(result, Err(ForecastError::ValidationError(_))));
}

#[test]
fn test_projection_strategy_dispatch() {
    let history = rows(2010, 2020);
    let future = vec![year(2021)];

    let default = ProjectionStrategy::default()
        .project(&names(), &history, &future)
        .unwrap();
    assert_eq!(default.values()[0], history[10].values);

    let strategy: ProjectionStrategy =
        serde_json::from_str(r#"{"kind": "trailing_mean", "window": 2}"#).unwrap();
    assert_eq!(strategy, ProjectionStrategy::TrailingMean { window: 2 });

    let empty = ProjectionStrategy::LastObserved.project(&names(), &[], &future);
    assert!(matches!(empty, Err(ForecastError::DataError(_))));
}
