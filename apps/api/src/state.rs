use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use crate::backup::service::BackupService;
use crate::config::Config;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub backup: Arc<BackupService>,
    /// Read access for report generation. Same store the backup service wraps.
    pub records: Arc<dyn RecordStore>,
    pub s3: S3Client,
    pub config: Config,
}
