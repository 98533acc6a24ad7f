//! Integration tests for the API layer.
//!
//! These tests spin up a real HTTP server on a random port with the real
//! handler set registered behind it.

use automed_api::{AppState, create_router};
use automed_common::{HandlerKind, HandlerRole};
use automed_coordinator::{CoordinatorConfig, HandlerSpec};
use serde_json::{Value, json};
use std::sync::Arc;

/// Spin up a test server for `config` and return the base URL.
async fn start_server_with(config: CoordinatorConfig) -> String {
    let state = Arc::new(AppState::new(config).await.unwrap());
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn start_test_server() -> String {
    start_server_with(CoordinatorConfig::default()).await
}

/// Helper to GET a URL and return (status, body).
async fn get(base: &str, path: &str) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .get(format!("{}{}", base, path))
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

/// Helper to POST a form body and return (status, body text).
async fn post_form(base: &str, path: &str, fields: &[(&str, &str)]) -> (u16, String) {
    let resp = reqwest::Client::new()
        .post(format!("{}{}", base, path))
        .form(fields)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.text().await.unwrap())
}

/// Helper to POST JSON and return (status, body text).
async fn post_json(base: &str, path: &str, body: &Value) -> (u16, String) {
    let resp = reqwest::Client::new()
        .post(format!("{}{}", base, path))
        .json(body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.text().await.unwrap())
}

// ============================================================================
// Health endpoint
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let base = start_test_server().await;
    let (status, body) = get(&base, "/health").await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert!(body["message"].is_string());
    assert!(body["version"].is_string());

    let active = body["active_specialists"].as_array().unwrap();
    assert_eq!(active.len(), 5);
    assert!(active.contains(&json!("CardioBotMock")));
    assert!(active.contains(&json!("NeuroBotMock")));
    assert!(active.contains(&json!("OrthoBotMock")));
}

// ============================================================================
// Diagnose endpoints
// ============================================================================

#[tokio::test]
async fn test_diagnose_chest_pain() {
    let base = start_test_server().await;
    let (status, body) = post_form(
        &base,
        "/diagnose",
        &[("patient_symptoms", "severe chest pain and shortness of breath")],
    )
    .await;
    assert_eq!(status, 200);

    let report: Value = serde_json::from_str(&body).unwrap();
    assert!(report["case_id"].is_string());
    assert_eq!(report["coordinating_agent"], "central-coordinator");
    assert_eq!(
        report["initial_assessment"]["hypothesis"],
        "Initial assessment in progress"
    );
    assert_eq!(report["initial_assessment"]["needs_emergency_care"], false);

    let specialists = report["specialist_assessments"].as_array().unwrap();
    assert_eq!(specialists.len(), 3);
    assert_eq!(specialists[0]["agent_name"], "CardioBotMock");
    assert!(
        specialists[0]["hypothesis"]
            .as_str()
            .unwrap()
            .contains("chest pain")
    );

    let synthesis = &report["synthesis"];
    assert_eq!(synthesis["patient_id"], report["case_id"]);
    assert_eq!(
        synthesis["triage_recommendation_mock"],
        "Mock Triage: Potential cardiac concern noted. Prioritize human review."
    );
    assert_eq!(synthesis["confidence_overall_mock"], 0.1);
    assert!(report.get("omitted_handlers").is_none());
}

#[tokio::test]
async fn test_diagnose_missing_field_is_422() {
    let base = start_test_server().await;
    let (status, _) = post_form(&base, "/diagnose", &[("symptoms", "cough")]).await;
    assert_eq!(status, 422);
}

#[tokio::test]
async fn test_each_request_gets_fresh_id() {
    let base = start_test_server().await;
    let (_, first) = post_form(&base, "/diagnose", &[("patient_symptoms", "cough")]).await;
    let (_, second) = post_form(&base, "/diagnose", &[("patient_symptoms", "cough")]).await;

    let first: Value = serde_json::from_str(&first).unwrap();
    let second: Value = serde_json::from_str(&second).unwrap();
    assert_ne!(first["case_id"], second["case_id"]);
}

#[tokio::test]
async fn test_diagnose_json_endpoint() {
    let base = start_test_server().await;
    let (status, body) = post_json(
        &base,
        "/api/v1/diagnose",
        &json!({ "symptoms": "recurring headache", "params": { "age": 31 } }),
    )
    .await;
    assert_eq!(status, 200);

    let report: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        report["synthesis"]["triage_recommendation_mock"],
        "Mock Triage: Review by a human telemedicine provider is recommended."
    );
    let neuro = &report["specialist_assessments"][1];
    assert_eq!(neuro["agent_name"], "NeuroBotMock");
    assert!(neuro["hypothesis"].as_str().unwrap().ends_with("Noted 'headache'."));
}

#[tokio::test]
async fn test_diagnose_json_missing_symptoms_is_422() {
    let base = start_test_server().await;
    let (status, _) = post_json(&base, "/api/v1/diagnose", &json!({ "params": {} })).await;
    assert_eq!(status, 422);
}

#[tokio::test]
async fn test_red_flag_config_adds_escalation() {
    let mut config = CoordinatorConfig::default();
    config.handlers[0].red_flags = vec!["chest pain".into()];
    let base = start_server_with(config).await;

    let (status, body) = post_form(&base, "/diagnose", &[("patient_symptoms", "chest pain")]).await;
    assert_eq!(status, 200);

    let report: Value = serde_json::from_str(&body).unwrap();
    let specialists = report["specialist_assessments"].as_array().unwrap();
    assert_eq!(specialists.len(), 4);
    assert_eq!(specialists[3]["emergency_response_needed"], false);
}

#[tokio::test]
async fn test_failure_maps_to_500_detail() {
    let config = CoordinatorConfig {
        handlers: vec![HandlerSpec::new(
            HandlerRole::ParallelSpecialist,
            HandlerKind::Cardiology,
        )],
        ..Default::default()
    };
    let base = start_server_with(config).await;

    let (status, body) = post_form(&base, "/diagnose", &[("patient_symptoms", "cough")]).await;
    assert_eq!(status, 500);

    let body: Value = serde_json::from_str(&body).unwrap();
    let detail = &body["detail"];
    assert!(detail["patient_id"].is_string());
    assert_eq!(
        detail["error"],
        "Failed to process diagnosis request due to an internal error."
    );
    assert_eq!(detail["code"], "NO_PRIMARY_ASSESSOR");
    assert!(detail["details"].is_string());
}

// ============================================================================
// Status endpoints
// ============================================================================

#[tokio::test]
async fn test_handlers_endpoint() {
    let base = start_test_server().await;
    post_form(&base, "/diagnose", &[("patient_symptoms", "knee pain")]).await;

    let (status, body) = get(&base, "/api/v1/handlers").await;
    assert_eq!(status, 200);

    let handlers = body.as_array().unwrap();
    assert_eq!(handlers.len(), 5);
    assert_eq!(handlers[0]["role"], "primary_assessor");
    assert_eq!(handlers[1]["role"], "escalation");

    let ortho = handlers.iter().find(|h| h["id"] == "OrthoBotMock").unwrap();
    assert_eq!(ortho["role"], "parallel_specialist");
    assert_eq!(ortho["state"]["specialty"], "Orthopedics");
    assert_eq!(ortho["state"]["cases_handled"], 1);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let base = start_test_server().await;
    post_form(&base, "/diagnose", &[("patient_symptoms", "cough")]).await;
    post_form(&base, "/diagnose", &[("patient_symptoms", "fever")]).await;

    let (status, body) = get(&base, "/api/v1/stats").await;
    assert_eq!(status, 200);
    assert_eq!(body["coordinator_id"], "central-coordinator");
    assert_eq!(body["total_handled"], 2);
    assert_eq!(body["total_failed"], 0);
    assert_eq!(body["in_flight"], 0);
    assert_eq!(body["registered_handlers"], 5);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let base = start_test_server().await;
    let resp = reqwest::get(format!("{}/api/v1/unknown", base)).await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
