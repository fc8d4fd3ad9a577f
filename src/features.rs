//! Reshaping of request payloads into the classifier's feature vector.
//!
//! The classifier and scaler were fit against one fixed column order. The
//! vector built here always follows that order, regardless of how the
//! fields were ordered in the request body.

use serde::Deserialize;

use crate::models::BiometricInput;

/// Number of columns the classifier was trained on.
pub const FEATURE_COUNT: usize = 6;

/// Column names as sent by clients, in model order.
pub const EXTERNAL_FEATURES: [&str; FEATURE_COUNT] = [
    "PrevDay_VeryActiveMinutes",
    "PrevDay_TotalMinutesAsleep",
    "SedentaryMinutes",
    "Calories",
    "PeakIntensityHour",
    "PrevDay_AvgSleepHR",
];

/// Column names the scaled model was fit on, in model order.
pub const SCALED_FEATURES: [&str; FEATURE_COUNT] = [
    "VeryActiveMinutes",
    "TotalMinutesAsleep",
    "SedentaryMinutes",
    "Calories",
    "PeakIntensityHour",
    "AvgSleepHR",
];

/// Which deployment flavour the service runs as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Single classifier fed with raw values under the external names.
    #[default]
    Plain,
    /// Classifier preceded by a fitted scaler, internal names shortened.
    Scaled,
}

impl Variant {
    /// Internal column names for this variant, in model order.
    pub fn feature_names(self) -> &'static [&'static str; FEATURE_COUNT] {
        match self {
            Variant::Plain => &EXTERNAL_FEATURES,
            Variant::Scaled => &SCALED_FEATURES,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Plain => "plain",
            Variant::Scaled => "scaled",
        }
    }
}

/// A single row of model input in the fixed column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    variant: Variant,
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn new(variant: Variant, values: [f64; FEATURE_COUNT]) -> Self {
        Self { variant, values }
    }

    /// Extract the six required fields in model order.
    pub fn from_input(input: &BiometricInput, variant: Variant) -> Self {
        Self::new(
            variant,
            [
                input.prev_day_very_active_minutes,
                input.prev_day_total_minutes_asleep,
                input.sedentary_minutes,
                input.calories,
                input.peak_intensity_hour,
                input.prev_day_avg_sleep_hr,
            ],
        )
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Same variant, new values. Used by scalers.
    pub fn with_values(&self, values: [f64; FEATURE_COUNT]) -> Self {
        Self::new(self.variant, values)
    }

    /// `(internal name, value)` pairs in model order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.variant
            .feature_names()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}
