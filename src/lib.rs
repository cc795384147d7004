//! Vehicle insurance cross-sell response service
//!
//! Serves a prediction form and a JSON endpoint that label a customer
//! record with the model's binary response (interested in vehicle
//! insurance or not).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    CROSS-SELL SERVER                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌────────────────────┐  │
//! │  │  HTTP     │──▶│ VehicleData  │──▶│  Predictor         │  │
//! │  │  (Axum)   │   │ (validate)   │   │  encode + classify │  │
//! │  └───────────┘   └──────────────┘   └─────────┬──────────┘  │
//! │                                               ▼ load once    │
//! │                                     ┌────────────────────┐  │
//! │                                     │  Artifact Store    │  │
//! │                                     │  (HTTP / local)    │  │
//! │                                     └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod publish;
pub mod storage;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
    services::ServeDir,
};

pub use error::{AppError, AppResult};

use pipeline::Predictor;
use storage::ArtifactBackend;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor<ArtifactBackend>>,
    pub config: config::Config,
}

impl AppState {
    pub fn new(predictor: Predictor<ArtifactBackend>, config: config::Config) -> Self {
        Self {
            predictor: Arc::new(predictor),
            config,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(handlers::predict::index).post(handlers::predict::predict_form))
        .route("/api/v1/predict", post(handlers::predict::predict_json))
        .route("/health", get(handlers::health::check))
        .nest_service("/static", static_files)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
