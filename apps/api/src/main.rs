mod backup;
mod config;
mod db;
mod errors;
mod models;
mod report;
mod routes;
mod state;
mod store;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::backup::service::BackupService;
use crate::config::Config;
use crate::db::{create_pool, create_redis};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgRecordStore;
use crate::store::snapshots::RedisSnapshotStore;
use crate::store::RecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration errors stop startup before anything else runs
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vitals API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let records: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(db));

    // Initialize Redis
    let redis = create_redis(&config.redis_url).await?;
    let snapshots = Arc::new(RedisSnapshotStore::new(redis));

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    let backup = Arc::new(BackupService::new(
        Arc::clone(&records),
        snapshots,
        config.snapshot_retention,
    ));
    info!(
        "Backup service ready (retention: {} snapshots per user)",
        config.snapshot_retention
    );

    // Build app state
    let state = AppState {
        backup,
        records,
        s3,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "vitals-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
