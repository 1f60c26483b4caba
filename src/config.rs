//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Artifacts ===
    /// Directory holding the schema and model files.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Schema file name, relative to `artifacts_dir`.
    #[serde(default = "default_schema_file")]
    pub schema_file: String,

    /// Model file name, relative to `artifacts_dir`.
    #[serde(default = "default_model_file")]
    pub model_file: String,

    // === Server Configuration ===
    /// Interface to bind.
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_schema_file() -> String {
    "columns.json".to_string()
}

fn default_model_file() -> String {
    "home_price_model.json".to_string()
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
            schema_file: default_schema_file(),
            model_file: default_model_file(),
            bind_host: default_bind_host(),
            port: default_port(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Load and validate in one step.
    pub fn load_validated() -> crate::Result<Self> {
        let config = Self::load()?;
        config.validate().map_err(AppError::InvalidConfig)?;
        Ok(config)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_file.trim().is_empty() {
            return Err("SCHEMA_FILE must not be empty".to_string());
        }

        if self.model_file.trim().is_empty() {
            return Err("MODEL_FILE must not be empty".to_string());
        }

        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        Ok(())
    }

    /// Full path of the schema file.
    pub fn schema_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.schema_file)
    }

    /// Full path of the model file.
    pub fn model_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.model_file)
    }
}
