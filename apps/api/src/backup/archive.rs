use aws_sdk_s3::primitives::ByteStream;
use tracing::info;
use uuid::Uuid;

use crate::backup::artifact::SnapshotArtifact;
use crate::errors::AppError;

pub fn archive_key(user_id: Uuid, snapshot_id: Uuid) -> String {
    format!("snapshots/{user_id}/{snapshot_id}.json")
}

/// Uploads the download artifact to S3 and returns its object key.
pub async fn archive_artifact(
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    artifact: &SnapshotArtifact,
) -> Result<String, AppError> {
    let s3_key = archive_key(artifact.snapshot.user_id, artifact.snapshot.id);
    let body = artifact.to_bytes()?;

    s3.put_object()
        .bucket(s3_bucket)
        .key(&s3_key)
        .body(ByteStream::from(body))
        .content_type("application/json")
        .content_disposition(format!("attachment; filename=\"{}\"", artifact.file_name()))
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Snapshot upload failed: {e}")))?;

    info!("Archived snapshot to s3://{}/{}", s3_bucket, s3_key);
    Ok(s3_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_key_layout() {
        let user = Uuid::nil();
        let snap = Uuid::nil();
        assert_eq!(
            archive_key(user, snap),
            format!("snapshots/{user}/{snap}.json")
        );
    }
}
