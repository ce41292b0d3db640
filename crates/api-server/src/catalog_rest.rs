//! Field catalog REST endpoint.
//!
//! The `group` and `type` query filters are the legacy subset contract:
//! consumers binding to `group=pixel_event` or `type=json` see the same
//! partitions in every catalog version.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use audience_core::fields::{CatalogVersion, FieldDescriptor, FieldGroup, FieldType};

use crate::rest::AppState;

/// GET /v1/catalog — Queryable fields for filter authors.
#[utoipa::path(
    get,
    path = "/v1/catalog",
    tag = "Catalog",
    params(
        ("version" = Option<CatalogVersion>, Query, description = "Catalog version, defaults to latest"),
        ("group" = Option<FieldGroup>, Query, description = "Restrict to one field group"),
        ("type" = Option<FieldType>, Query, description = "Restrict to one storage type"),
    ),
    responses(
        (status = 200, description = "Ordered field descriptors", body = CatalogResponse),
    )
)]
pub async fn get_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Json<CatalogResponse> {
    let version = query.version.unwrap_or_else(CatalogVersion::latest);
    let items: Vec<FieldDescriptor> = state
        .registry
        .fields(version)
        .iter()
        .filter(|f| query.group.map_or(true, |g| f.group == g))
        .filter(|f| query.field_type.map_or(true, |t| f.field_type == t))
        .cloned()
        .collect();
    Json(CatalogResponse { version, items })
}

#[derive(Deserialize)]
pub struct CatalogQuery {
    pub version: Option<CatalogVersion>,
    pub group: Option<FieldGroup>,
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
}

#[derive(Serialize, ToSchema)]
pub struct CatalogResponse {
    pub version: CatalogVersion,
    pub items: Vec<FieldDescriptor>,
}
