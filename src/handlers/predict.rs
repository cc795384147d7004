//! Prediction handlers

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    response::Html,
    Form, Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{VehicleData, VehicleForm};
use crate::pipeline::Label;
use crate::{AppError, AppResult, AppState};

const PAGE_TEMPLATE: &str = include_str!("../../templates/vehicledata.html");

/// Context shown before anything has been submitted
const INITIAL_CONTEXT: &str = "Rendering";

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub status: bool,
    pub prediction: u8,
    pub label: &'static str,
}

/// Fill the page's single placeholder
pub fn render_page(context: &str) -> Html<String> {
    Html(PAGE_TEMPLATE.replace("{{ context }}", context))
}

/// GET / - empty prediction form
pub async fn index() -> Html<String> {
    render_page(INITIAL_CONTEXT)
}

/// POST / - form submission, answered with the rendered page
pub async fn predict_form(
    State(state): State<AppState>,
    form: Result<Form<VehicleForm>, FormRejection>,
) -> AppResult<Html<String>> {
    let Form(form) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let label = run_prediction(&state, &form.into_fields()).await?;
    Ok(render_page(label.status()))
}

/// POST /api/v1/predict - JSON record, JSON answer
pub async fn predict_json(
    State(state): State<AppState>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Json(fields) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let label = run_prediction(&state, &fields).await?;
    Ok(Json(PredictResponse {
        status: true,
        prediction: label.value(),
        label: label.status(),
    }))
}

async fn run_prediction(state: &AppState, fields: &Map<String, Value>) -> AppResult<Label> {
    let request_id = Uuid::new_v4();

    let record = VehicleData::from_map(fields).map_err(|e| {
        tracing::info!(%request_id, field = e.field(), "Rejected record: {}", e);
        AppError::from(e)
    })?;

    match state.predictor.predict(&record).await {
        Ok(label) => {
            tracing::info!(%request_id, label = label.value(), "Prediction served");
            Ok(label)
        }
        Err(e) => {
            tracing::warn!(%request_id, "Prediction failed: {}", e);
            Err(e.into())
        }
    }
}
