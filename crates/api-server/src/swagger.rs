//! OpenAPI specification and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AudienceLab API",
        version = "0.1.0",
        description = "Audience field catalog and filter-expression compiler.\n\nVersioned field vocabulary, filter compilation to parameterized query fragments, hierarchical segment resolution, and ad-platform sync configuration.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Catalog", description = "Versioned queryable-field catalog"),
        (name = "Segments", description = "Audience segments — creation, hierarchy, lifecycle, compiled filters"),
        (name = "Syncs", description = "Ad-platform sync configuration"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        // Catalog
        crate::catalog_rest::get_catalog,
        // Segments
        crate::segment_rest::create_audience,
        crate::segment_rest::list_segments,
        crate::segment_rest::create_segment,
        crate::segment_rest::update_segment_filter,
        crate::segment_rest::transition_segment,
        crate::segment_rest::remove_segment,
        crate::segment_rest::compiled_segment,
        // Syncs
        crate::sync_rest::create_sync,
        crate::sync_rest::list_segment_syncs,
        // Operations
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        // Catalog types
        audience_core::fields::CatalogVersion,
        audience_core::fields::FieldType,
        audience_core::fields::FieldGroup,
        audience_core::fields::FieldDescriptor,
        crate::catalog_rest::CatalogResponse,
        // Segment types
        audience_core::segment::Audience,
        audience_core::segment::Segment,
        audience_core::segment::SegmentStatus,
        crate::segment_rest::CreateAudienceRequest,
        crate::segment_rest::CreateSegmentRequest,
        crate::segment_rest::UpdateFilterRequest,
        crate::segment_rest::TransitionRequest,
        crate::segment_rest::SegmentListResponse,
        crate::segment_rest::RemoveSegmentResponse,
        crate::segment_rest::CompiledFilterResponse,
        // Sync types
        crate::sync_rest::CreateSyncRequest,
        crate::sync_rest::SyncResponse,
        crate::sync_rest::SyncListResponse,
        // REST error/health types
        crate::rest::ErrorResponse,
        crate::rest::HealthResponse,
    ))
)]
pub struct ApiDoc;
