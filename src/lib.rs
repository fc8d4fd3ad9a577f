//! HTTP service that classifies next-day fatigue from wearable biometrics.

pub mod config;
pub mod error;
pub mod features;
pub mod handlers;
pub mod inference;
pub mod model_store;
pub mod models;

pub use config::AppConfig;
pub use error::{ModelError, PredictError};
pub use features::{FeatureVector, Variant};
pub use model_store::ModelStore;
