//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API against an in-memory object store.
//!
//! ## Intended use
//! Development and debugging of the HTTP surface (with OpenAPI/Swagger UI) without an S3
//! service. Nothing survives a restart. The workspace's main `stowage-run` binary serves the
//! same router against a real bucket.

use std::sync::Arc;
use stowage_core::CoreConfig;
use stowage_storage::{MemoryObjectStore, ObjectStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the development REST server
///
/// # Environment Variables
/// - `STOWAGE_ADDR`: Server address (default: "0.0.0.0:3000")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("STOWAGE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let store = Arc::new(MemoryObjectStore::new("user-files"));
    store.ensure_bucket().await?;

    tracing::info!("-- Starting Stowage REST API (in-memory store) on {}", addr);

    let state = api_rest::AppState::new(store, Arc::new(CoreConfig::default()));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, api_rest::router(state)).await?;

    Ok(())
}
