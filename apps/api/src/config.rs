use anyhow::{bail, Context, Result};

use crate::backup::service::DEFAULT_RETENTION;

/// Upload cap for backup files sent to the import route.
pub const DEFAULT_MAX_IMPORT_BYTES: usize = 64 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Number of snapshots kept per user before the oldest is evicted.
    pub snapshot_retention: usize,
    /// Largest backup file the import route accepts, in bytes.
    pub max_import_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let snapshot_retention = std::env::var("SNAPSHOT_RETENTION")
            .unwrap_or_else(|_| DEFAULT_RETENTION.to_string())
            .parse::<usize>()
            .context("SNAPSHOT_RETENTION must be a positive integer")?;
        if snapshot_retention == 0 {
            bail!("SNAPSHOT_RETENTION must be at least 1");
        }

        let max_import_bytes = std::env::var("MAX_IMPORT_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_IMPORT_BYTES.to_string())
            .parse::<usize>()
            .context("MAX_IMPORT_BYTES must be a positive integer")?;
        if max_import_bytes == 0 {
            bail!("MAX_IMPORT_BYTES must be at least 1");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            snapshot_retention,
            max_import_bytes,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}
