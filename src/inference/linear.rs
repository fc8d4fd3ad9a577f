//! Parameter-file artifacts: logistic regression and standard scaling.

use std::fs;
use std::path::Path;

use ndarray::Array1;
use serde::Deserialize;

use super::{check_feature_names, Classifier, Prediction, Scaler};
use crate::error::ModelError;
use crate::features::{FeatureVector, Variant, FEATURE_COUNT};

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Deserialize)]
struct LogisticParams {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    coefficients: Vec<f64>,
    intercept: f64,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

#[derive(Debug, Deserialize)]
struct ScalerParams {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ModelError> {
    let raw = fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| ModelError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn to_column(values: Vec<f64>) -> Result<Array1<f64>, ModelError> {
    if values.len() != FEATURE_COUNT {
        return Err(ModelError::Shape {
            expected: FEATURE_COUNT,
            found: values.len(),
        });
    }
    Ok(Array1::from(values))
}

fn as_row(features: &FeatureVector) -> Array1<f64> {
    Array1::from(features.values().to_vec())
}

/// Logistic regression: `p = sigmoid(intercept + w·x)`, fatigued when `p > threshold`.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    coefficients: Array1<f64>,
    intercept: f64,
    threshold: f64,
}

impl LogisticClassifier {
    pub fn new(coefficients: [f64; FEATURE_COUNT], intercept: f64) -> Self {
        Self {
            coefficients: Array1::from(coefficients.to_vec()),
            intercept,
            threshold: default_threshold(),
        }
    }

    pub fn load(path: &Path, variant: Variant) -> Result<Self, ModelError> {
        let params: LogisticParams = read_json(path)?;
        check_feature_names(params.feature_names.as_deref(), variant)?;
        Ok(Self {
            coefficients: to_column(params.coefficients)?,
            intercept: params.intercept,
            threshold: params.threshold,
        })
    }

    fn sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }
}

impl Classifier for LogisticClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        let z = self.intercept + self.coefficients.dot(&as_row(features));
        let probability = Self::sigmoid(z);
        let class = i64::from(probability > self.threshold);
        Prediction::new(class, probability)
    }
}

/// Standardisation with pre-fit column statistics: `(x - mean) / scale`.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn new(mean: [f64; FEATURE_COUNT], scale: [f64; FEATURE_COUNT]) -> Self {
        Self {
            mean: Array1::from(mean.to_vec()),
            scale: Self::guard_scale(Array1::from(scale.to_vec())),
        }
    }

    pub fn load(path: &Path, variant: Variant) -> Result<Self, ModelError> {
        let params: ScalerParams = read_json(path)?;
        check_feature_names(params.feature_names.as_deref(), variant)?;
        Ok(Self {
            mean: to_column(params.mean)?,
            scale: Self::guard_scale(to_column(params.scale)?),
        })
    }

    // Constant columns were fit with scale 0; leave them centred but unscaled.
    fn guard_scale(scale: Array1<f64>) -> Array1<f64> {
        scale.mapv(|s| if s == 0.0 { 1.0 } else { s })
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> Result<FeatureVector, ModelError> {
        let scaled = (as_row(features) - &self.mean) / &self.scale;
        let mut values = [0.0; FEATURE_COUNT];
        for (slot, value) in values.iter_mut().zip(scaled) {
            *slot = value;
        }
        Ok(features.with_values(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SCALED_FEATURES;
    use std::io::Write;

    fn write_json(value: serde_json::Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(value.to_string().as_bytes()).unwrap();
        file
    }

    fn sample() -> FeatureVector {
        FeatureVector::new(Variant::Scaled, [45.0, 380.0, 600.0, 2200.0, 18.0, 58.0])
    }

    #[test]
    fn test_even_odds_predict_rested() {
        // Zero decision value is not positive, so the tie goes to class 0.
        let model = LogisticClassifier::new([0.0; FEATURE_COUNT], 0.0);
        let prediction = model.predict(&sample()).unwrap();
        assert_eq!(prediction.probability, 0.5);
        assert_eq!(prediction.label.as_u8(), 0);
    }

    #[test]
    fn test_positive_decision_predicts_fatigued() {
        let model = LogisticClassifier::new([0.0; FEATURE_COUNT], 1e-6);
        let prediction = model.predict(&sample()).unwrap();
        assert!(prediction.probability > 0.5);
        assert_eq!(prediction.label.as_u8(), 1);
    }

    #[test]
    fn test_negative_intercept_predicts_rested() {
        let model = LogisticClassifier::new([0.0; FEATURE_COUNT], -2.0);
        let prediction = model.predict(&sample()).unwrap();
        assert_eq!(prediction.label.as_u8(), 0);
        assert!((prediction.probability - 0.1192).abs() < 1e-3);
    }

    #[test]
    fn test_scaler_standardises_columns() {
        let scaler = StandardScaler::new(
            [45.0, 400.0, 600.0, 2000.0, 18.0, 60.0],
            [15.0, 20.0, 0.0, 100.0, 3.0, 2.0],
        );
        let scaled = scaler.transform(&sample()).unwrap();
        assert_eq!(scaled.values(), &[0.0, -1.0, 0.0, 2.0, 0.0, -1.0]);
        assert_eq!(scaled.variant(), Variant::Scaled);
    }

    #[test]
    fn test_load_logistic_from_json() {
        let file = write_json(serde_json::json!({
            "feature_names": SCALED_FEATURES,
            "coefficients": [0.1, -0.01, 0.002, 0.0, 0.05, 0.03],
            "intercept": -1.5
        }));
        let model = LogisticClassifier::load(file.path(), Variant::Scaled).unwrap();
        assert_eq!(model.threshold, 0.5);
        assert_eq!(model.coefficients.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_load_rejects_wrong_column_order() {
        let mut names = SCALED_FEATURES.to_vec();
        names.swap(0, 1);
        let file = write_json(serde_json::json!({
            "feature_names": names,
            "coefficients": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            "intercept": 0.0
        }));
        let result = LogisticClassifier::load(file.path(), Variant::Scaled);
        assert!(matches!(result, Err(ModelError::FeatureMismatch { .. })));
    }

    #[test]
    fn test_load_rejects_wrong_width() {
        let file = write_json(serde_json::json!({
            "mean": [1.0, 2.0],
            "scale": [1.0, 1.0]
        }));
        let result = StandardScaler::load(file.path(), Variant::Scaled);
        assert!(matches!(
            result,
            Err(ModelError::Shape {
                expected: 6,
                found: 2
            })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = StandardScaler::load(Path::new("does/not/exist.json"), Variant::Scaled);
        assert!(matches!(result, Err(ModelError::Io { .. })));
    }
}
