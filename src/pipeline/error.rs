//! Error types for the inference pipeline

use thiserror::Error;

use crate::models::ValidationError;
use crate::storage::StoreError;

/// Failure while turning a raw row into the encoded feature row
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("column '{0}' is missing from the input row")]
    MissingColumn(String),

    #[error("unknown category '{value}' for column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("column '{column}' expected {expected}")]
    WrongType {
        column: String,
        expected: &'static str,
    },

    #[error("column mismatch: preprocessor expects {expected:?}, got {actual:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// The model failed while producing a label
#[derive(Debug, Clone, PartialEq, Error)]
#[error("InferenceError: {0}")]
pub struct InferenceError(pub String);

/// Every failure `Predictor::predict` can report
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("artifact not found: {bucket}/{key}")]
    ArtifactNotFound { bucket: String, key: String },

    #[error("artifact storage error: {0}")]
    Transport(String),

    #[error("invalid artifact {key}: {reason}")]
    InvalidArtifact { key: String, reason: String },

    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl From<StoreError> for PredictError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { bucket, key } => PredictError::ArtifactNotFound { bucket, key },
            other => PredictError::Transport(other.to_string()),
        }
    }
}
