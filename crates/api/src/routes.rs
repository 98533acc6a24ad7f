//! HTTP route handlers for the API.

use crate::AppState;
use automed_common::{AggregateReport, RequestContext};
use automed_coordinator::{CoordinatorStats, DiagnosisFailure, HandlerSummary};
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info};

const HEALTH_MESSAGE: &str = "AutoMed is running with the hierarchical agent architecture";
const DIAGNOSIS_FAILED: &str = "Failed to process diagnosis request due to an internal error.";

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub active_specialists: Vec<String>,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let active_specialists = state.coordinator.active_specialists().await;
    info!(active_specialists = ?active_specialists, "Health check endpoint called");

    Json(HealthResponse {
        status: "healthy",
        message: HEALTH_MESSAGE,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        active_specialists,
    })
}

/// Form body for `POST /diagnose`.
#[derive(Debug, Deserialize)]
pub struct DiagnoseForm {
    pub patient_symptoms: String,
}

/// JSON body for `POST /api/v1/diagnose`.
#[derive(Debug, Deserialize)]
pub struct DiagnoseRequest {
    pub symptoms: String,
    /// Extra parameters passed through to every handler
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Body of a failed diagnosis response.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub patient_id: String,
    pub error: &'static str,
    pub details: String,
    pub code: &'static str,
}

/// API error response, always a 500 wrapped as `{"detail": {...}}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: ErrorDetail,
}

impl From<DiagnosisFailure> for ErrorResponse {
    fn from(failure: DiagnosisFailure) -> Self {
        Self {
            detail: ErrorDetail {
                patient_id: failure.request_id.clone(),
                error: DIAGNOSIS_FAILED,
                details: failure.error.to_string(),
                code: failure.code(),
            },
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// Diagnose symptoms submitted as a form field.
pub async fn diagnose_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<DiagnoseForm>,
) -> Result<Json<AggregateReport>, ErrorResponse> {
    run_diagnosis(&state, RequestContext::new(form.patient_symptoms)).await
}

/// Diagnose symptoms submitted as JSON, with optional handler parameters.
pub async fn diagnose_json(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DiagnoseRequest>,
) -> Result<Json<AggregateReport>, ErrorResponse> {
    let ctx = RequestContext::new(request.symptoms).with_params(request.params);
    run_diagnosis(&state, ctx).await
}

async fn run_diagnosis(
    state: &AppState,
    ctx: RequestContext,
) -> Result<Json<AggregateReport>, ErrorResponse> {
    info!(
        patient_id = %ctx.request_id(),
        symptoms_length = ctx.symptoms().len(),
        symptoms_preview = %ctx.symptoms().chars().take(100).collect::<String>(),
        "Diagnosis request received"
    );

    state.coordinator.process(ctx).await.map(Json).map_err(|failure| {
        error!(
            patient_id = %failure.request_id,
            code = failure.code(),
            error = %failure.error,
            "Error processing diagnosis request"
        );
        ErrorResponse::from(failure)
    })
}

/// Registered handlers with their role and current state.
pub async fn list_handlers(State(state): State<Arc<AppState>>) -> Json<Vec<HandlerSummary>> {
    Json(state.coordinator.registry().snapshot().await)
}

/// Coordinator counters.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub coordinator_id: String,
    #[serde(flatten)]
    pub stats: CoordinatorStats,
    pub registered_handlers: usize,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        coordinator_id: state.coordinator.id().to_string(),
        stats: state.coordinator.stats(),
        registered_handlers: state.coordinator.registry().len().await,
    })
}
