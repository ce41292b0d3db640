//! Shared handler state, the uniform error envelope, and operational
//! endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;

use audience_catalog::CatalogRegistry;
use audience_core::AudienceError;
use audience_segments::{SegmentResolver, SegmentStore};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CatalogRegistry>,
    pub store: Arc<SegmentStore>,
    pub resolver: Arc<SegmentResolver>,
    pub node_id: String,
    pub start_time: Instant,
}

/// Uniform failure envelope: `error` is a short machine-readable code,
/// `details` the underlying error's message.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

/// Wrap a domain error for the wire. Every handler failure goes through
/// here so clients always see the same envelope and status.
pub(crate) fn error_envelope(err: &AudienceError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.code().to_string(),
            details: err.to_string(),
        }),
    )
}

/// GET /health — Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses(
        (status = 200, description = "Service health", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses(
        (status = 200, description = "Ready to accept traffic"),
        (status = 503, description = "Not ready"),
    )
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    // The registry is frozen at startup; once it serves the latest catalog
    // the service can take traffic.
    if state.registry.latest().fields().is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /live — Liveness probe.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses(
        (status = 200, description = "Alive"),
    )
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}
