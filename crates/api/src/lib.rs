//! HTTP gateway for the AutoMed diagnosis coordinator.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check with the active handler ids
//! - `POST /diagnose` - Diagnose a `patient_symptoms` form field
//! - `POST /api/v1/diagnose` - Diagnose a JSON `{symptoms, params}` body
//! - `GET /api/v1/handlers` - Registered handlers, their roles and state
//! - `GET /api/v1/stats` - Coordinator request counters
//!
//! # Architecture
//!
//! ```text
//! Client
//!    │
//!    ▼
//! ┌─────────────────┐
//! │   API Gateway   │ ◄── This crate
//! │     (Axum)      │
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │   Coordinator   │ ──► │    Handler      │
//! │                 │     │    Registry     │
//! └─────────────────┘     └─────────────────┘
//! ```

pub mod routes;
pub mod state;
pub mod telemetry;

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use state::AppState;
pub use telemetry::{LogFormat, init_tracing};

/// Create the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/diagnose", post(routes::diagnose_form))
        // API v1
        .route("/api/v1/diagnose", post(routes::diagnose_json))
        .route("/api/v1/handlers", get(routes::list_handlers))
        .route("/api/v1/stats", get(routes::stats))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the API server on the given address.
///
/// Runs until Ctrl-C, then stops every registered handler.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let router = create_router(state.clone());

    info!(%addr, "Starting AutoMed API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down AutoMed API server");
    match state.shutdown().await {
        Ok(stopped) => info!(stopped, "All handlers stopped"),
        Err(e) => error!(error = %e, code = e.code(), "Handler teardown incomplete"),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
