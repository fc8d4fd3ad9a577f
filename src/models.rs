use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::inference::Prediction;

/// Request body of `POST /predict`. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct BiometricInput {
    #[serde(rename = "PrevDay_VeryActiveMinutes", deserialize_with = "numeric")]
    pub prev_day_very_active_minutes: f64,
    #[serde(rename = "PrevDay_TotalMinutesAsleep", deserialize_with = "numeric")]
    pub prev_day_total_minutes_asleep: f64,
    #[serde(rename = "SedentaryMinutes", deserialize_with = "numeric")]
    pub sedentary_minutes: f64,
    #[serde(rename = "Calories", deserialize_with = "numeric")]
    pub calories: f64,
    #[serde(rename = "PeakIntensityHour", deserialize_with = "numeric")]
    pub peak_intensity_hour: f64,
    #[serde(rename = "PrevDay_AvgSleepHR", deserialize_with = "numeric")]
    pub prev_day_avg_sleep_hr: f64,
}

impl BiometricInput {
    pub fn from_slice(body: &[u8]) -> Result<Self, PredictError> {
        serde_json::from_slice(body).map_err(|e| PredictError::InvalidInput(e.to_string()))
    }
}

/// Accepts JSON numbers and finite numeric strings.
fn numeric<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumericVisitor;

    impl<'de> Visitor<'de> for NumericVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or numeric string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            if v.is_finite() {
                Ok(v)
            } else {
                Err(E::invalid_value(de::Unexpected::Float(v), &self))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v.trim().parse::<f64>() {
                Ok(parsed) => self.visit_f64(parsed),
                Err(_) => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }
    }

    deserializer.deserialize_any(NumericVisitor)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub is_fatigued: u8,
    pub confidence_score: f64,
    pub recommendation: &'static str,
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            is_fatigued: prediction.label.as_u8(),
            confidence_score: round2(prediction.probability),
            recommendation: prediction.label.recommendation(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&PredictError> for ErrorResponse {
    fn from(err: &PredictError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Two decimal places, rounding the exact binary value with ties to even.
fn round2(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= 1e15 {
        return value;
    }

    // 1100 places hold the full expansion of any f64, so formatting is exact.
    let exact = format!("{:.1100}", value.abs());
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let digits = fraction.as_bytes();
    let digit = |i: usize| digits.get(i).map_or(0, |&d| u64::from(d - b'0'));

    let mut cents = whole.parse::<u64>().unwrap_or(0) * 100 + digit(0) * 10 + digit(1);
    let round_up = match digits.get(2) {
        Some(b'6'..=b'9') => true,
        Some(b'5') => digits[3..].iter().any(|&d| d != b'0') || cents % 2 == 1,
        _ => false,
    };
    if round_up {
        cents += 1;
    }
    (cents as f64 / 100.0).copysign(value)
}
