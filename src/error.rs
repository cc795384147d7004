//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::models::ValidationError;
use crate::pipeline::PredictError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    BadRequest(String),
    Validation(String),
    Encoding(String),

    // Artifact errors
    ArtifactNotFound(String),
    Storage(String),
    InvalidArtifact(String),

    // Model errors
    Inference(String),

    // Generic errors
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) | AppError::Encoding(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ArtifactNotFound(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidArtifact(_) | AppError::Inference(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::Validation(msg)
            | AppError::Encoding(msg)
            | AppError::ArtifactNotFound(msg)
            | AppError::Storage(msg)
            | AppError::InvalidArtifact(msg)
            | AppError::Inference(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::BadRequest(msg) | AppError::Validation(msg) | AppError::Encoding(msg) => {
                tracing::debug!("Rejected request: {}", msg);
            }
            AppError::ArtifactNotFound(msg) => tracing::error!("Artifact missing: {}", msg),
            AppError::Storage(msg) => tracing::error!("Storage error: {}", msg),
            AppError::InvalidArtifact(msg) => tracing::error!("Invalid artifact: {}", msg),
            AppError::Inference(msg) => tracing::error!("Inference error: {}", msg),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
        }

        let body = Json(json!({
            "status": false,
            "error": self.message(),
        }));

        (status, body).into_response()
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        let msg = err.to_string();
        match err {
            PredictError::Validation(_) => AppError::Validation(msg),
            PredictError::ArtifactNotFound { .. } => AppError::ArtifactNotFound(msg),
            PredictError::Transport(_) => AppError::Storage(msg),
            PredictError::InvalidArtifact { .. } => AppError::InvalidArtifact(msg),
            PredictError::Encoding(_) => AppError::Encoding(msg),
            PredictError::Inference(_) => AppError::Inference(msg),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        PredictError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{EncodingError, InferenceError};

    #[test]
    fn test_predict_error_mapping() {
        let err: AppError = PredictError::ArtifactNotFound {
            bucket: "models".into(),
            key: "model.onnx".into(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.message().contains("models/model.onnx"));

        let err: AppError = PredictError::from(EncodingError::UnknownCategory {
            column: "Gender".into(),
            value: "Other".into(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: AppError = PredictError::from(InferenceError("bad shape".into())).into();
        assert_eq!(err.message(), "InferenceError: bad shape");
    }

    #[test]
    fn test_validation_error_names_field() {
        let err: AppError = ValidationError::Missing { field: "Age" }.into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message().contains("Age"));
    }
}
