//! Classifier and scaler abstractions plus the artifact formats behind them.
//!
//! Artifacts are picked by file extension: `.onnx` graphs run through tract,
//! `.json` files carry logistic regression or standard scaler parameters.

pub mod linear;
pub mod onnx;

use std::path::Path;

use tracing::info;

use crate::error::ModelError;
use crate::features::{FeatureVector, Variant};

pub use linear::{LogisticClassifier, StandardScaler};
pub use onnx::{OnnxClassifier, OnnxScaler};

/// Binary fatigue label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatigueLabel {
    Rested,
    Fatigued,
}

impl FatigueLabel {
    pub fn from_class(class: i64) -> Result<Self, ModelError> {
        match class {
            0 => Ok(FatigueLabel::Rested),
            1 => Ok(FatigueLabel::Fatigued),
            other => Err(ModelError::InvalidOutput(format!(
                "label {} is not a binary class",
                other
            ))),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            FatigueLabel::Rested => 0,
            FatigueLabel::Fatigued => 1,
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            FatigueLabel::Fatigued => {
                "High fatigue predicted. Recommend rest or a light recovery session."
            }
            FatigueLabel::Rested => "Low fatigue predicted. Ready for scheduled training.",
        }
    }
}

/// Label plus probability of the fatigued class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: FatigueLabel,
    pub probability: f64,
}

impl Prediction {
    /// Validates raw model output.
    pub fn new(class: i64, probability: f64) -> Result<Self, ModelError> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ModelError::InvalidOutput(format!(
                "probability {} is outside [0, 1]",
                probability
            )));
        }
        Ok(Self {
            label: FatigueLabel::from_class(class)?,
            probability,
        })
    }
}

/// A pre-trained binary classifier.
///
/// Implementations are shared across actix workers and must tolerate
/// concurrent calls through `&self`.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError>;
}

/// A pre-fit transform applied to raw features before inference.
pub trait Scaler: Send + Sync {
    fn transform(&self, features: &FeatureVector) -> Result<FeatureVector, ModelError>;
}

/// Load a classifier artifact for the given variant.
pub fn load_classifier(path: &Path, variant: Variant) -> Result<Box<dyn Classifier>, ModelError> {
    info!(path = %path.display(), variant = variant.as_str(), "Loading classifier");
    match extension(path) {
        Some("onnx") => Ok(Box::new(OnnxClassifier::load(path)?)),
        Some("json") => Ok(Box::new(LogisticClassifier::load(path, variant)?)),
        _ => Err(ModelError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load a scaler artifact for the given variant.
pub fn load_scaler(path: &Path, variant: Variant) -> Result<Box<dyn Scaler>, ModelError> {
    info!(path = %path.display(), variant = variant.as_str(), "Loading scaler");
    match extension(path) {
        Some("onnx") => Ok(Box::new(OnnxScaler::load(path)?)),
        Some("json") => Ok(Box::new(StandardScaler::load(path, variant)?)),
        _ => Err(ModelError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Reject artifacts fit on a different column order than the variant uses.
pub(crate) fn check_feature_names(
    found: Option<&[String]>,
    variant: Variant,
) -> Result<(), ModelError> {
    let Some(found) = found else {
        return Ok(());
    };
    let expected = variant.feature_names();
    if found.len() != expected.len() || found.iter().zip(expected.iter()).any(|(a, b)| a != b) {
        return Err(ModelError::FeatureMismatch {
            expected: expected.iter().map(|name| name.to_string()).collect(),
            found: found.to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_per_label() {
        assert_eq!(
            FatigueLabel::Fatigued.recommendation(),
            "High fatigue predicted. Recommend rest or a light recovery session."
        );
        assert_eq!(
            FatigueLabel::Rested.recommendation(),
            "Low fatigue predicted. Ready for scheduled training."
        );
    }

    #[test]
    fn test_prediction_validates_output() {
        assert!(Prediction::new(1, 0.7).is_ok());
        assert!(Prediction::new(2, 0.7).is_err());
        assert!(Prediction::new(0, 1.2).is_err());
        assert!(Prediction::new(0, f64::NAN).is_err());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = load_classifier(Path::new("fatigue_model_final.pkl"), Variant::Plain);
        assert!(matches!(result, Err(ModelError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_feature_name_check() {
        let scaled: Vec<String> = Variant::Scaled
            .feature_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(check_feature_names(Some(&scaled), Variant::Scaled).is_ok());
        assert!(check_feature_names(Some(&scaled), Variant::Plain).is_err());
        assert!(check_feature_names(None, Variant::Plain).is_ok());
    }
}
