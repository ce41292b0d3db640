//! API server — router assembly and HTTP/metrics startup.

use crate::rest::{self, AppState};
use crate::swagger::ApiDoc;
use crate::{catalog_rest, segment_rest, sync_rest};
use audience_catalog::CatalogRegistry;
use audience_core::config::AppConfig;
use audience_segments::{SegmentResolver, SegmentStore};
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub struct ApiServer {
    config: AppConfig,
    registry: Arc<CatalogRegistry>,
    store: Arc<SegmentStore>,
    resolver: Arc<SegmentResolver>,
}

impl ApiServer {
    pub fn new(
        config: AppConfig,
        registry: Arc<CatalogRegistry>,
        store: Arc<SegmentStore>,
        resolver: Arc<SegmentResolver>,
    ) -> Self {
        Self {
            config,
            registry,
            store,
            resolver,
        }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            registry: self.registry.clone(),
            store: self.store.clone(),
            resolver: self.resolver.clone(),
            node_id: self.config.node_id.clone(),
            start_time: Instant::now(),
        };

        let app = Router::new()
            // Audience & segment endpoints
            .route("/v1/audiences", post(segment_rest::create_audience))
            .route(
                "/v1/audiences/:audience_id/segments",
                get(segment_rest::list_segments).post(segment_rest::create_segment),
            )
            .route(
                "/v1/segments/:id/filter",
                put(segment_rest::update_segment_filter),
            )
            .route(
                "/v1/segments/:id/status",
                post(segment_rest::transition_segment),
            )
            .route("/v1/segments/:id", delete(segment_rest::remove_segment))
            .route(
                "/v1/segments/:id/compiled",
                get(segment_rest::compiled_segment),
            )
            // Sync configuration
            .route("/v1/syncs", post(sync_rest::create_sync))
            .route("/v1/segments/:id/syncs", get(sync_rest::list_segment_syncs))
            // Field catalog
            .route("/v1/catalog", get(catalog_rest::get_catalog))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // API docs
            .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics exporter on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
