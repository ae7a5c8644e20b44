//! Error types for Sleep Quality

use thiserror::Error;

/// Errors that can occur while loading artifacts or running a prediction
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Failed to load artifact {path}: {reason}")]
    ArtifactLoad { path: String, reason: String },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Unrecognized value {value:?} for categorical attribute {attribute}")]
    UnrecognizedCategory { attribute: String, value: String },

    #[error("Scaler expects {expected} features, got {actual}")]
    ScalerShapeMismatch { expected: usize, actual: usize },

    #[error("Missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("Invalid attribute {attribute}: {reason}")]
    InvalidAttribute { attribute: String, reason: String },

    #[error("Attribute {attribute} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        attribute: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),
}

impl PredictError {
    /// Build an `ArtifactLoad` error for a file path
    pub fn artifact_load(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        PredictError::ArtifactLoad {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error was raised by the input boundary (caller-supplied values)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PredictError::UnrecognizedCategory { .. }
                | PredictError::MissingAttribute(_)
                | PredictError::InvalidAttribute { .. }
                | PredictError::OutOfRange { .. }
        )
    }
}
