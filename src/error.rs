//! Unified error types for the home price service.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the home price service.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration values failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Artifact loading error.
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Prediction error.
    #[error("prediction error: {0}")]
    Predict(#[from] PredictError),
}

/// Errors raised while reading the schema and model artifacts.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Artifact file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Schema document is not valid JSON or lacks `data_columns`.
    #[error("malformed schema file {}: {source}", path.display())]
    SchemaFormat {
        /// Schema file path.
        path: PathBuf,
        /// Parse error.
        source: serde_json::Error,
    },

    /// Model document could not be deserialized.
    #[error("malformed model file {}: {source}", path.display())]
    ModelFormat {
        /// Model file path.
        path: PathBuf,
        /// Parse error.
        source: serde_json::Error,
    },

    /// Schema has fewer columns than the fixed numeric features.
    #[error("schema has {len} columns, need at least {required}")]
    SchemaTooShort {
        /// Number of columns found.
        len: usize,
        /// Minimum number of columns.
        required: usize,
    },

    /// Model structure is inconsistent.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// Model splits on a column the schema does not have.
    #[error("model reads feature {feature} but schema has {schema} columns")]
    FeatureOutOfRange {
        /// Highest feature index the model reads.
        feature: usize,
        /// Schema length.
        schema: usize,
    },

    /// Model and schema disagree on the feature count.
    #[error("model expects {model} features but schema has {schema}")]
    FeatureMismatch {
        /// Feature count declared by the model.
        model: usize,
        /// Schema length.
        schema: usize,
    },
}

/// Errors raised while serving a price estimate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// Artifacts have not been loaded yet.
    #[error("model artifacts are not loaded")]
    NotLoaded,

    /// A request field is missing or cannot be coerced.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// Offending field name.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The model produced NaN or infinity.
    #[error("model produced a non-finite estimate: {0}")]
    NonFiniteOutput(f64),
}

impl PredictError {
    /// Build an input error for `field`.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PredictError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
