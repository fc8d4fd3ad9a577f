//! Process-wide classifier (and scaler) loaded once at startup.

use tracing::{debug, error, info};

use crate::config::ModelConfig;
use crate::error::{ModelError, PredictError};
use crate::features::{FeatureVector, Variant};
use crate::inference::{self, Classifier, Prediction, Scaler};

struct LoadedModels {
    classifier: Box<dyn Classifier>,
    scaler: Option<Box<dyn Scaler>>,
}

/// Read-only model state shared by all request handlers.
///
/// The scaled variant may be `unloaded`: every prediction then fails with
/// [`PredictError::ModelUnavailable`] until the process is restarted.
pub struct ModelStore {
    variant: Variant,
    models: Option<LoadedModels>,
}

impl ModelStore {
    /// Raw features straight into the classifier.
    pub fn plain(classifier: Box<dyn Classifier>) -> Self {
        Self {
            variant: Variant::Plain,
            models: Some(LoadedModels {
                classifier,
                scaler: None,
            }),
        }
    }

    /// Features are scaled before reaching the classifier.
    pub fn scaled(classifier: Box<dyn Classifier>, scaler: Box<dyn Scaler>) -> Self {
        Self {
            variant: Variant::Scaled,
            models: Some(LoadedModels {
                classifier,
                scaler: Some(scaler),
            }),
        }
    }

    /// Scaled variant whose artifacts failed to load.
    pub fn unloaded() -> Self {
        Self {
            variant: Variant::Scaled,
            models: None,
        }
    }

    /// Load artifacts for the configured variant.
    ///
    /// The plain variant returns the load error so the caller can abort. The
    /// scaled variant logs it and degrades to an unloaded store; a failure of
    /// either artifact leaves both unavailable.
    pub fn load(config: &ModelConfig) -> Result<Self, ModelError> {
        let model_path = config.model_path();
        match config.variant {
            Variant::Plain => {
                let classifier = inference::load_classifier(&model_path, Variant::Plain)?;
                info!(path = %model_path.display(), "Model loaded successfully");
                Ok(Self::plain(classifier))
            }
            Variant::Scaled => {
                let scaler_path = config.scaler_path();
                let loaded = inference::load_classifier(&model_path, Variant::Scaled).and_then(
                    |classifier| {
                        inference::load_scaler(&scaler_path, Variant::Scaled)
                            .map(|scaler| (classifier, scaler))
                    },
                );
                match loaded {
                    Ok((classifier, scaler)) => {
                        info!(
                            model = %model_path.display(),
                            scaler = %scaler_path.display(),
                            "Model and scaler loaded successfully"
                        );
                        Ok(Self::scaled(classifier, scaler))
                    }
                    Err(e) => {
                        error!(
                            model = %model_path.display(),
                            scaler = %scaler_path.display(),
                            error = %e,
                            "Error loading model or scaler, predictions disabled"
                        );
                        Ok(Self::unloaded())
                    }
                }
            }
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn is_loaded(&self) -> bool {
        self.models.is_some()
    }

    /// Fails fast when the artifacts are missing, before any input is read.
    pub fn ensure_loaded(&self) -> Result<(), PredictError> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(PredictError::ModelUnavailable)
        }
    }

    /// Scale (if configured) and classify one feature vector.
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, PredictError> {
        let models = self.models.as_ref().ok_or(PredictError::ModelUnavailable)?;

        let prediction = match &models.scaler {
            Some(scaler) => {
                let scaled = scaler.transform(features)?;
                debug!(values = ?scaled.values(), "Scaled features");
                models.classifier.predict(&scaled)?
            }
            None => models.classifier.predict(features)?,
        };
        Ok(prediction)
    }
}
