//! Service configuration
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! environment variables, then command-line flags (applied by the binary).

use flightdelay_core::validation::{DEFAULT_AIRLINES, DEFAULT_FLIGHT_TYPES};
use flightdelay_core::FlightValidator;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "DELAY_SERVICE_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime settings for the prediction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Artifact JSON written by the trainer
    pub model_path: PathBuf,
    /// JSON-lines prediction log; served predictions go to tracing when unset
    pub prediction_log: Option<PathBuf>,
    pub allowed_airlines: Vec<String>,
    pub allowed_flight_types: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            model_path: PathBuf::from("models/delay_model.json"),
            prediction_log: None,
            allowed_airlines: DEFAULT_AIRLINES.iter().map(|s| s.to_string()).collect(),
            allowed_flight_types: DEFAULT_FLIGHT_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ServiceConfig {
    /// Defaults, then `path` (or `$DELAY_SERVICE_CONFIG`), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "loaded service config");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `DELAY_HOST`, `PORT`, `DELAY_MODEL_PATH` and `DELAY_PREDICTION_LOG`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("DELAY_HOST") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                self.host = trimmed.to_string();
            }
        }

        if let Some(value) = lookup("PORT") {
            match value.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => warn!(value = %value, "ignoring invalid PORT"),
            }
        }

        if let Some(value) = lookup("DELAY_MODEL_PATH") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                self.model_path = PathBuf::from(trimmed);
            }
        }

        if let Some(value) = lookup("DELAY_PREDICTION_LOG") {
            let trimmed = value.trim();
            self.prediction_log = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_airlines.is_empty() {
            return Err(ConfigError::Invalid("allowed_airlines is empty".into()));
        }
        if self.allowed_flight_types.is_empty() {
            return Err(ConfigError::Invalid("allowed_flight_types is empty".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validator(&self) -> FlightValidator {
        FlightValidator::new(
            self.allowed_airlines.iter().cloned(),
            self.allowed_flight_types.iter().cloned(),
        )
    }
}
