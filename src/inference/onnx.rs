//! ONNX graphs executed with tract.
//!
//! Classifiers are expected in the sklearn-onnx layout exported with
//! `zipmap=False`: a `[1, 6]` float input, an int64 `label` output and a
//! `[1, 2]` float `probabilities` output. Graphs with a single output are
//! read as probabilities only, and a positive-class probability above 0.5
//! is labelled fatigued.

use std::path::Path;

use tract_onnx::prelude::*;
use tracing::{debug, info};

use super::{Classifier, Prediction, Scaler};
use crate::error::ModelError;
use crate::features::{FeatureVector, FEATURE_COUNT};

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

fn onnx_error(err: impl std::fmt::Display) -> ModelError {
    ModelError::Onnx(err.to_string())
}

/// Load, pin the input to `[1, 6]` f32 and optimise.
fn load_plan(path: &Path) -> Result<OnnxPlan, ModelError> {
    if !path.exists() {
        return Err(ModelError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        });
    }

    let plan = tract_onnx::onnx()
        .model_for_path(path)
        .map_err(onnx_error)?
        .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, FEATURE_COUNT)))
        .map_err(onnx_error)?
        .into_optimized()
        .map_err(onnx_error)?
        .into_runnable()
        .map_err(onnx_error)?;

    info!(path = %path.display(), "ONNX graph ready");
    Ok(plan)
}

/// Features are narrowed to f32 only here, at the graph boundary.
fn run(plan: &OnnxPlan, features: &FeatureVector) -> Result<TVec<TValue>, ModelError> {
    let row = features.values().map(|v| v as f32);
    let input = tract_ndarray::arr2(&[row]).into_tensor();
    plan.run(tvec!(input.into())).map_err(onnx_error)
}

fn floats(value: &TValue) -> Result<Vec<f32>, ModelError> {
    let view = value.to_array_view::<f32>().map_err(onnx_error)?;
    Ok(view.iter().copied().collect())
}

/// Probability of the positive class from a `[1, 2]` or `[1, 1]` output.
fn positive_probability(values: &[f32]) -> Result<f64, ModelError> {
    match values {
        [_, positive] => Ok(f64::from(*positive)),
        [positive] => Ok(f64::from(*positive)),
        other => Err(ModelError::InvalidOutput(format!(
            "expected 1 or 2 class probabilities, got {}",
            other.len()
        ))),
    }
}

/// Label for graphs that only emit probabilities; exactly 0.5 is rested.
fn implied_class(probability: f64) -> i64 {
    i64::from(probability > 0.5)
}

pub struct OnnxClassifier {
    plan: OnnxPlan,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Ok(Self {
            plan: load_plan(path)?,
        })
    }

    fn label(value: &TValue) -> Result<i64, ModelError> {
        let view = value.to_array_view::<i64>().map_err(onnx_error)?;
        view.iter()
            .next()
            .copied()
            .ok_or_else(|| ModelError::InvalidOutput("empty label output".to_string()))
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        let outputs = run(&self.plan, features)?;

        let (class, probability) = match outputs.as_slice() {
            [label, probabilities, ..] => (
                Self::label(label)?,
                positive_probability(&floats(probabilities)?)?,
            ),
            [probabilities] => {
                let probability = positive_probability(&floats(probabilities)?)?;
                (implied_class(probability), probability)
            }
            [] => {
                return Err(ModelError::InvalidOutput(
                    "graph produced no outputs".to_string(),
                ))
            }
        };

        debug!(class, probability, "ONNX classifier output");
        Prediction::new(class, probability)
    }
}

pub struct OnnxScaler {
    plan: OnnxPlan,
}

impl OnnxScaler {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Ok(Self {
            plan: load_plan(path)?,
        })
    }
}

impl Scaler for OnnxScaler {
    fn transform(&self, features: &FeatureVector) -> Result<FeatureVector, ModelError> {
        let outputs = run(&self.plan, features)?;
        let first = outputs
            .first()
            .ok_or_else(|| ModelError::InvalidOutput("graph produced no outputs".to_string()))?;
        let scaled = floats(first)?;

        if scaled.len() != FEATURE_COUNT {
            return Err(ModelError::Shape {
                expected: FEATURE_COUNT,
                found: scaled.len(),
            });
        }

        let mut values = [0.0; FEATURE_COUNT];
        for (slot, value) in values.iter_mut().zip(scaled) {
            *slot = f64::from(value);
        }
        Ok(features.with_values(values))
    }
}
