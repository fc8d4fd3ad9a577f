//! Service configuration.
//!
//! Defaults are set in code, then overridden by `config/config.toml` (or an
//! explicit file) and finally by `FATIGUE_`-prefixed environment variables,
//! e.g. `FATIGUE_SERVER__PORT=8080`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::features::Variant;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which artifacts to load and from where.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub variant: Variant,
    /// Classifier artifact; defaults depend on the variant.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Scaler artifact, only read by the scaled variant.
    #[serde(default)]
    pub scaler_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub level: String,
}

impl ModelConfig {
    pub fn model_path(&self) -> PathBuf {
        self.model_path.clone().unwrap_or_else(|| match self.variant {
            Variant::Plain => PathBuf::from("fatigue_model_final.onnx"),
            Variant::Scaled => PathBuf::from("fatigue_model.onnx"),
        })
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.scaler_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("scaler.onnx"))
    }
}

/// `FATIGUE_SECTION__KEY` overrides `section.key`.
fn environment() -> Environment {
    Environment::with_prefix("FATIGUE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl AppConfig {
    /// Load from `config/config.toml` if present.
    pub fn load() -> Result<Self> {
        Self::build(
            File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(false),
            environment(),
        )
    }

    /// Load from a specific file, which must exist.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::build(File::from(path), environment())
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    fn build<S>(file: S, env: Environment) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000_i64)?
            .set_default("model.variant", "plain")?
            .set_default("logging.level", "info")?
            .add_source(file)
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
