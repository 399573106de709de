use gdp_forecast::error::ForecastError;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);
    assert!(matches!(forecast_error, ForecastError::IoError(_)));

    let parse_error = "invalid data".parse::<i32>().unwrap_err();
    assert!(matches!(
        ForecastError::from(parse_error),
        ForecastError::ParseError(_)
    ));

    let parse_error = "2016-13-01".parse::<chrono::NaiveDate>().unwrap_err();
    assert!(matches!(
        ForecastError::from(parse_error),
        ForecastError::ParseError(_)
    ));

    let math_error = outlook_math::MathError::InvalidInput("bad".to_string());
    assert!(matches!(
        ForecastError::from(math_error),
        ForecastError::MathError(_)
    ));

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(
        ForecastError::from(json_error),
        ForecastError::JsonError(_)
    ));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("interval width must be in (0, 1)".to_string());
    assert!(error.to_string().contains("interval width must be in (0, 1)"));

    let error = ForecastError::SchemaMismatch {
        missing: vec!["Country and Regions Name".to_string(), "Indicators Name".to_string()],
    };
    assert_eq!(
        error.to_string(),
        "Schema mismatch: missing column(s) Country and Regions Name, Indicators Name"
    );

    let error = ForecastError::InsufficientData {
        country: "Nigeria".to_string(),
        series: "Inflation".to_string(),
        known: 1,
    };
    let message = error.to_string();
    assert!(message.contains("Nigeria"));
    assert!(message.contains("Inflation"));

    let error = ForecastError::KpiNotFound("Real GDP growth (annual %)".to_string());
    assert!(error.to_string().contains("Real GDP growth (annual %)"));
}
