use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stowage_core::config::core_config_from_env;
use stowage_storage::{ObjectStore, S3Config, S3ObjectStore};

/// Main entry point for the Stowage application
///
/// Resolves configuration, makes sure the bucket exists and serves the REST API.
///
/// # Environment Variables
/// - `STOWAGE_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `STOWAGE_S3_*`: bucket, region, endpoint, credentials and addressing style
/// - `STOWAGE_TENANT_PREFIX` / `STOWAGE_TENANT_SUFFIX`: tenant root layout
/// - `STOWAGE_MAX_UPLOAD_BYTES`: upload size limit (default: 10 MiB)
/// - `STOWAGE_FANOUT_CONCURRENCY`: parallel copies/deletes per directory operation
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid, the bucket cannot be provisioned,
///   or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stowage=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let env = |name: &str| std::env::var(name).ok();
    let addr = env("STOWAGE_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into());

    let cfg = Arc::new(core_config_from_env(env)?);
    let s3_config = S3Config::from_env(env)?;
    tracing::info!(
        "++ Using bucket {} (endpoint: {})",
        s3_config.bucket,
        s3_config.endpoint.as_deref().unwrap_or("default")
    );

    let store = S3ObjectStore::connect(s3_config).await?;
    if let Err(e) = store.ensure_bucket().await {
        anyhow::bail!("Object store is not usable: {}", e);
    }

    tracing::info!("++ Starting Stowage REST on {}", addr);

    let state = api_rest::AppState::new(Arc::new(store), cfg);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, api_rest::router(state)).await?;

    Ok(())
}
