//! Audience and segment REST endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use audience_core::filter::FilterNode;
use audience_core::segment::{Audience, Segment, SegmentStatus};

use crate::rest::{error_envelope, AppState, ErrorResponse};

/// POST /v1/audiences — Register an audience.
#[utoipa::path(
    post,
    path = "/v1/audiences",
    tag = "Segments",
    request_body = CreateAudienceRequest,
    responses(
        (status = 200, description = "Registered audience", body = Audience),
        (status = 500, description = "Failure", body = ErrorResponse),
    )
)]
pub async fn create_audience(
    State(state): State<AppState>,
    Json(request): Json<CreateAudienceRequest>,
) -> Result<Json<Audience>, (StatusCode, Json<ErrorResponse>)> {
    let audience = match request.parent_audience_id {
        Some(parent) => Audience::nested(request.id, request.name, parent),
        None => Audience::new(request.id, request.name),
    };
    state.store.register_audience(audience.clone()).map_err(|e| {
        warn!(audience_id = %audience.id, error = %e, "audience registration failed");
        error_envelope(&e)
    })?;
    Ok(Json(audience))
}

/// GET /v1/audiences/{audience_id}/segments — List segments in scope.
///
/// Without `parent_audience_id` returns the audience's top-level segments;
/// with it, only segments nested under that parent.
#[utoipa::path(
    get,
    path = "/v1/audiences/{audience_id}/segments",
    tag = "Segments",
    params(
        ("audience_id" = String, Path, description = "Owning audience id"),
        ("parent_audience_id" = Option<String>, Query, description = "Parent scope to list under"),
    ),
    responses(
        (status = 200, description = "Segments in creation order", body = SegmentListResponse),
        (status = 500, description = "Failure", body = ErrorResponse),
    )
)]
pub async fn list_segments(
    State(state): State<AppState>,
    Path(audience_id): Path<String>,
    Query(query): Query<ListSegmentsQuery>,
) -> Result<Json<SegmentListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let items = state
        .resolver
        .list_segments(&audience_id, query.parent_audience_id.as_deref())
        .map_err(|e| {
            warn!(audience_id = %audience_id, error = %e, "segment listing failed");
            metrics::counter!("segments.list_errors").increment(1);
            error_envelope(&e)
        })?;
    Ok(Json(SegmentListResponse { items }))
}

/// POST /v1/audiences/{audience_id}/segments — Create a segment.
#[utoipa::path(
    post,
    path = "/v1/audiences/{audience_id}/segments",
    tag = "Segments",
    params(("audience_id" = String, Path, description = "Owning audience id")),
    request_body = CreateSegmentRequest,
    responses(
        (status = 200, description = "Created segment", body = Segment),
        (status = 500, description = "Failure", body = ErrorResponse),
    )
)]
pub async fn create_segment(
    State(state): State<AppState>,
    Path(audience_id): Path<String>,
    Json(request): Json<CreateSegmentRequest>,
) -> Result<Json<Segment>, (StatusCode, Json<ErrorResponse>)> {
    let segment = state
        .store
        .create_segment(
            &audience_id,
            request.parent_audience_id,
            request.name,
            request.filter,
        )
        .map_err(|e| {
            warn!(audience_id = %audience_id, error = %e, "segment creation failed");
            metrics::counter!("segments.create_errors").increment(1);
            error_envelope(&e)
        })?;
    metrics::counter!("segments.created").increment(1);
    Ok(Json(segment))
}

/// PUT /v1/segments/{id}/filter — Replace a segment's filter.
#[utoipa::path(
    put,
    path = "/v1/segments/{id}/filter",
    tag = "Segments",
    params(("id" = Uuid, Path, description = "Segment id")),
    request_body = UpdateFilterRequest,
    responses(
        (status = 200, description = "Updated segment", body = Segment),
        (status = 500, description = "Failure", body = ErrorResponse),
    )
)]
pub async fn update_segment_filter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateFilterRequest>,
) -> Result<Json<Segment>, (StatusCode, Json<ErrorResponse>)> {
    let segment = state.store.update_filter(id, request.filter).map_err(|e| {
        warn!(segment_id = %id, error = %e, "filter update failed");
        error_envelope(&e)
    })?;
    Ok(Json(segment))
}

/// POST /v1/segments/{id}/status — Apply a lifecycle transition.
#[utoipa::path(
    post,
    path = "/v1/segments/{id}/status",
    tag = "Segments",
    params(("id" = Uuid, Path, description = "Segment id")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Segment after transition", body = Segment),
        (status = 500, description = "Failure", body = ErrorResponse),
    )
)]
pub async fn transition_segment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Segment>, (StatusCode, Json<ErrorResponse>)> {
    let segment = state.store.transition(id, request.status).map_err(|e| {
        warn!(segment_id = %id, error = %e, "status transition failed");
        error_envelope(&e)
    })?;
    Ok(Json(segment))
}

/// DELETE /v1/segments/{id} — Remove a segment.
///
/// Segments referenced by a sync config are archived instead of deleted.
#[utoipa::path(
    delete,
    path = "/v1/segments/{id}",
    tag = "Segments",
    params(("id" = Uuid, Path, description = "Segment id")),
    responses(
        (status = 200, description = "Removal outcome", body = RemoveSegmentResponse),
        (status = 500, description = "Failure", body = ErrorResponse),
    )
)]
pub async fn remove_segment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RemoveSegmentResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (segment, archived) = state.store.remove_segment(id).map_err(|e| {
        warn!(segment_id = %id, error = %e, "segment removal failed");
        error_envelope(&e)
    })?;
    info!(segment_id = %id, archived = archived, "segment removal handled");
    Ok(Json(RemoveSegmentResponse {
        id: segment.id,
        archived,
    }))
}

/// GET /v1/segments/{id}/compiled — The compiled query fragment.
///
/// Compiled under the segment's pinned catalog version. This payload is what
/// gets handed to the ad-platform sync collaborator.
#[utoipa::path(
    get,
    path = "/v1/segments/{id}/compiled",
    tag = "Segments",
    params(("id" = Uuid, Path, description = "Segment id")),
    responses(
        (status = 200, description = "Compiled filter", body = CompiledFilterResponse),
        (status = 500, description = "Failure", body = ErrorResponse),
    )
)]
pub async fn compiled_segment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompiledFilterResponse>, (StatusCode, Json<ErrorResponse>)> {
    let segment = state.store.get_segment(id).map_err(|e| error_envelope(&e))?;
    let compiled = state.resolver.resolve_filter(&segment).map_err(|e| {
        warn!(segment_id = %id, error = %e, "filter resolution failed");
        metrics::counter!("segments.compile_errors").increment(1);
        error_envelope(&e)
    })?;
    Ok(Json(CompiledFilterResponse {
        sql: compiled.sql,
        params: compiled.params,
        stale: state.resolver.is_stale(&segment),
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct CreateAudienceRequest {
    pub id: String,
    pub name: String,
    pub parent_audience_id: Option<String>,
}

#[derive(Deserialize)]
pub struct ListSegmentsQuery {
    pub parent_audience_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSegmentRequest {
    pub name: String,
    pub parent_audience_id: Option<String>,
    #[schema(value_type = Object)]
    pub filter: FilterNode,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateFilterRequest {
    #[schema(value_type = Object)]
    pub filter: FilterNode,
}

#[derive(Deserialize, ToSchema)]
pub struct TransitionRequest {
    pub status: SegmentStatus,
}

#[derive(Serialize, ToSchema)]
pub struct SegmentListResponse {
    pub items: Vec<Segment>,
}

#[derive(Serialize, ToSchema)]
pub struct RemoveSegmentResponse {
    pub id: Uuid,
    pub archived: bool,
}

#[derive(Serialize, ToSchema)]
pub struct CompiledFilterResponse {
    pub sql: String,
    #[schema(value_type = Vec<Object>)]
    pub params: Vec<Value>,
    /// True when the filter references fields the latest catalog dropped.
    pub stale: bool,
}
