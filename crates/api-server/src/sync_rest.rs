//! Ad-platform sync configuration endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use audience_core::sync::{RefreshInterval, SyncConfig};

use crate::rest::{error_envelope, AppState, ErrorResponse};

/// POST /v1/syncs — Register a sync of a segment to an ad-platform audience.
#[utoipa::path(
    post,
    path = "/v1/syncs",
    tag = "Syncs",
    request_body = CreateSyncRequest,
    responses(
        (status = 200, description = "Registered sync", body = SyncResponse),
        (status = 500, description = "Failure", body = ErrorResponse),
    )
)]
pub async fn create_sync(
    State(state): State<AppState>,
    Json(request): Json<CreateSyncRequest>,
) -> Result<Json<SyncResponse>, (StatusCode, Json<ErrorResponse>)> {
    let interval = RefreshInterval::try_from(request.refresh_interval_days).map_err(|e| {
        warn!(days = request.refresh_interval_days, "rejected refresh interval");
        error_envelope(&e)
    })?;
    let config = state
        .store
        .register_sync(SyncConfig::new(
            request.segment_id,
            request.ad_account_id,
            request.destination_audience_id,
            interval,
        ))
        .map_err(|e| {
            warn!(segment_id = %request.segment_id, error = %e, "sync registration failed");
            error_envelope(&e)
        })?;
    Ok(Json(SyncResponse::from(config)))
}

/// GET /v1/segments/{id}/syncs — Sync configs referencing a segment.
#[utoipa::path(
    get,
    path = "/v1/segments/{id}/syncs",
    tag = "Syncs",
    params(("id" = Uuid, Path, description = "Segment id")),
    responses(
        (status = 200, description = "Sync configs", body = SyncListResponse),
    )
)]
pub async fn list_segment_syncs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<SyncListResponse> {
    let items = state
        .store
        .syncs_for(id)
        .into_iter()
        .map(SyncResponse::from)
        .collect();
    Json(SyncListResponse { items })
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSyncRequest {
    pub segment_id: Uuid,
    pub ad_account_id: String,
    pub destination_audience_id: String,
    /// Must be one of 1, 3, 7, 14, 30.
    pub refresh_interval_days: u32,
}

#[derive(Serialize, ToSchema)]
pub struct SyncResponse {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub ad_account_id: String,
    pub destination_audience_id: String,
    pub refresh_interval_days: u32,
}

impl From<SyncConfig> for SyncResponse {
    fn from(config: SyncConfig) -> Self {
        Self {
            id: config.id,
            segment_id: config.segment_id,
            ad_account_id: config.ad_account_id,
            destination_audience_id: config.destination_audience_id,
            refresh_interval_days: config.refresh_interval.days(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SyncListResponse {
    pub items: Vec<SyncResponse>,
}
