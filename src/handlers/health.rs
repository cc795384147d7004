//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::pipeline::PredictorStatus;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    environment: String,
    storage: &'static str,
    predictor: PredictorStatus,
}

/// Liveness plus artifact cache state. Never triggers a load.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let predictor = state.predictor.status();

    Json(HealthResponse {
        status: if predictor.model_loaded && predictor.preprocessor_loaded {
            "healthy"
        } else {
            "awaiting_first_prediction"
        },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        environment: state.config.environment.clone(),
        storage: state.predictor.store().name(),
        predictor,
    })
}
