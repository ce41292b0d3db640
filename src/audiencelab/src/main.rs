//! AudienceLab — audience field catalog and filter-expression compiler.
//!
//! Main entry point that freezes the catalog registry, wires the segment
//! store and resolver, and starts the HTTP server.

use audience_api::ApiServer;
use audience_catalog::CatalogRegistry;
use audience_compiler::FilterCompiler;
use audience_core::config::AppConfig;
use audience_segments::{SegmentResolver, SegmentStore};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "audiencelab")]
#[command(about = "Audience field catalog and filter-expression compiler")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "AUDIENCELAB__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "AUDIENCELAB__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "AUDIENCELAB__METRICS__PORT")]
    metrics_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audiencelab=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("AudienceLab starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        "Configuration loaded"
    );

    // Freeze the field catalog registry (load -> freeze -> serve)
    let registry = Arc::new(CatalogRegistry::bootstrap()?);

    // Wire the compiler, store, and resolver
    let compiler = Arc::new(FilterCompiler::new(registry.clone()));
    let store = Arc::new(SegmentStore::new(compiler.clone()));
    let resolver = Arc::new(SegmentResolver::new(
        registry.clone(),
        compiler.clone(),
        store.clone(),
    ));

    let server = ApiServer::new(config, registry, store, resolver);

    if let Err(e) = server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    server.start_http().await
}
