//! Records produced by the pipeline and consumed by the dashboard

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which part of the timeline a forecast record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    #[serde(rename = "Historical (Train)")]
    HistoricalTrain,
    #[serde(rename = "Historical (Test)")]
    HistoricalTest,
    #[serde(rename = "Forecast (Test)")]
    ForecastTest,
    #[serde(rename = "Forecast (Future)")]
    ForecastFuture,
}

impl Segment {
    pub fn is_forecast(&self) -> bool {
        matches!(self, Segment::ForecastTest | Segment::ForecastFuture)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Segment::HistoricalTrain => "Historical (Train)",
            Segment::HistoricalTest => "Historical (Test)",
            Segment::ForecastTest => "Forecast (Test)",
            Segment::ForecastFuture => "Forecast (Future)",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One point of the historical/forecast timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    #[serde(rename = "Country")]
    pub country: String,
    pub ds: NaiveDate,
    /// Actual value for historical segments, point forecast otherwise
    #[serde(rename = "y")]
    pub value: f64,
    #[serde(rename = "yhat_lower")]
    pub lower: f64,
    #[serde(rename = "yhat_upper")]
    pub upper: f64,
    #[serde(rename = "type")]
    pub segment: Segment,
}

impl ForecastRecord {
    /// Historical record: bounds collapse onto the actual value
    pub fn historical(country: &str, ds: NaiveDate, actual: f64, segment: Segment) -> Self {
        Self {
            country: country.to_string(),
            ds,
            value: actual,
            lower: actual,
            upper: actual,
            segment,
        }
    }

    pub fn forecast(
        country: &str,
        ds: NaiveDate,
        point: f64,
        lower: f64,
        upper: f64,
        segment: Segment,
    ) -> Self {
        Self {
            country: country.to_string(),
            ds,
            value: point,
            lower,
            upper,
            segment,
        }
    }
}

/// Test-window accuracy of one country's model
///
/// MAPE divides by the actual value without a guard: actuals near zero
/// inflate it and an actual of exactly zero makes it infinite or NaN. The
/// value is reported as computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "RMSE", with = "non_finite")]
    pub rmse: f64,
    #[serde(rename = "MAE", with = "non_finite")]
    pub mae: f64,
    #[serde(rename = "MAPE", with = "non_finite")]
    pub mape: f64,
}

impl fmt::Display for MetricRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evaluation Metrics for {}:", self.country)?;
        writeln!(f, "  RMSE: {:.4}", self.rmse)?;
        writeln!(f, "  MAE:  {:.4}", self.mae)?;
        writeln!(f, "  MAPE: {:.2}%", self.mape)?;
        Ok(())
    }
}

/// Additive breakdown of one test-window prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    #[serde(rename = "Country")]
    pub country: String,
    pub ds: NaiveDate,
    pub trend: f64,
    #[serde(rename = "yearly")]
    pub seasonality: f64,
    /// Effect per regressor column
    #[serde(flatten)]
    pub effects: BTreeMap<String, f64>,
    #[serde(rename = "Regressors_Effect")]
    pub regressors_effect: f64,
}

impl ComponentRecord {
    /// Sum of every additive component
    pub fn total(&self) -> f64 {
        self.trend + self.seasonality + self.effects.values().sum::<f64>()
    }
}

/// Mean absolute effect of one feature for one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceRecord {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Feature")]
    pub feature: String,
    #[serde(rename = "Importance")]
    pub importance: f64,
}

/// Serde helpers that keep NaN and infinities representable in JSON
pub mod non_finite {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value > 0.0 {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("invalid number '{}'", other))),
            },
        }
    }
}
