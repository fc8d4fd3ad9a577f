use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or running a model artifact.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("onnx runtime error: {0}")]
    Onnx(String),

    #[error("unsupported artifact format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("artifact was fit on columns {found:?}, expected {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("expected {expected} values, got {found}")]
    Shape { expected: usize, found: usize },

    #[error("invalid model output: {0}")]
    InvalidOutput(String),
}

/// Failures surfaced to the client of `POST /predict`.
///
/// Every variant is rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Model or scaler not loaded.")]
    ModelUnavailable,

    #[error("Invalid input data format: {0}")]
    InvalidInput(String),

    #[error("Inference failed: {0}")]
    Inference(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message() {
        assert_eq!(
            PredictError::ModelUnavailable.to_string(),
            "Model or scaler not loaded."
        );
    }

    #[test]
    fn test_invalid_input_embeds_cause() {
        let err = PredictError::InvalidInput("missing field `Calories`".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid input data format: missing field `Calories`"
        );
    }

    #[test]
    fn test_inference_wraps_model_error() {
        let err: PredictError = ModelError::InvalidOutput("label 3".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Inference failed: invalid model output: label 3"
        );
    }
}
