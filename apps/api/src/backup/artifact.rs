use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::snapshot::Snapshot;

/// Bumped whenever the artifact or record layout changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

/// The downloadable form of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotArtifact {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub snapshot: Snapshot,
}

impl SnapshotArtifact {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            exported_at: Utc::now(),
            snapshot,
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "backup-{}-{}.json",
            self.snapshot.created_at.format("%Y-%m-%d"),
            self.snapshot.id
        )
    }

    pub fn to_bytes(&self) -> Result<Bytes, AppError> {
        Ok(Bytes::from(serde_json::to_vec_pretty(self)?))
    }

    /// Parses an uploaded artifact. Rejects files from other format versions before looking
    /// at their contents.
    pub fn parse(bytes: &[u8]) -> Result<Self, AppError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| AppError::Validation(format!("Backup file is not valid JSON: {e}")))?;

        match value.get("format_version").and_then(|v| v.as_u64()) {
            Some(v) if v == u64::from(FORMAT_VERSION) => {}
            Some(v) => {
                return Err(AppError::Validation(format!(
                    "Unsupported backup format version {v} (expected {FORMAT_VERSION})"
                )))
            }
            None => {
                return Err(AppError::Validation(
                    "Backup file has no format_version".to_string(),
                ))
            }
        }

        serde_json::from_value(value)
            .map_err(|e| AppError::Validation(format!("Backup file is malformed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::summary::compute_counts;
    use crate::models::records::fixtures::*;
    use crate::models::records::SnapshotTables;
    use crate::models::snapshot::SnapshotKind;
    use uuid::Uuid;

    fn snapshot() -> Snapshot {
        let user = Uuid::new_v4();
        let tables = SnapshotTables {
            health_entries: vec![health_entry(user, day(1), Some(2))],
            ..Default::default()
        };
        Snapshot {
            id: Uuid::new_v4(),
            user_id: user,
            name: "Manual backup".to_string(),
            kind: SnapshotKind::Manual,
            created_at: ts(),
            size_bytes: 100,
            counts: compute_counts(&tables),
            tables,
        }
    }

    #[test]
    fn test_parse_accepts_own_output() {
        let original = snapshot();
        let bytes = SnapshotArtifact::new(original.clone()).to_bytes().unwrap();
        let parsed = SnapshotArtifact::parse(&bytes).unwrap();
        assert_eq!(parsed.snapshot, original);
    }

    #[test]
    fn test_parse_rejects_other_versions() {
        let mut value = serde_json::to_value(SnapshotArtifact::new(snapshot())).unwrap();
        value["format_version"] = serde_json::json!(99);
        let bytes = serde_json::to_vec(&value).unwrap();
        let err = SnapshotArtifact::parse(&bytes).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("99")));
    }

    #[test]
    fn test_parse_rejects_missing_version() {
        let err = SnapshotArtifact::parse(br#"{"snapshot": {}}"#).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            SnapshotArtifact::parse(b"not json"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_file_name_embeds_date_and_id() {
        let artifact = SnapshotArtifact::new(snapshot());
        let name = artifact.file_name();
        assert!(name.starts_with("backup-2026-03-01-"));
        assert!(name.ends_with(".json"));
    }
}
