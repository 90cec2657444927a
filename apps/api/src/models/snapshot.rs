use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::records::SnapshotTables;
use crate::models::tables::Table;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Manual,
    Automatic,
}

impl SnapshotKind {
    pub fn label(self) -> &'static str {
        match self {
            SnapshotKind::Manual => "Manual",
            SnapshotKind::Automatic => "Automatic",
        }
    }
}

/// Row counts for a snapshot, per table and per logical group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCounts {
    pub tables: BTreeMap<Table, usize>,
    pub core_entries: usize,
    pub fitbit_data: usize,
    pub womens_health: usize,
    pub lab_results: usize,
    pub integrations: usize,
    pub total: usize,
}

/// A point-in-time copy of every tracked table for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: SnapshotKind,
    pub created_at: DateTime<Utc>,
    pub size_bytes: usize,
    pub counts: SnapshotCounts,
    pub tables: SnapshotTables,
}

/// The listing form of a snapshot, stored separately so listings never decode payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: SnapshotKind,
    pub created_at: DateTime<Utc>,
    pub size_bytes: usize,
    pub counts: SnapshotCounts,
}

impl From<&Snapshot> for SnapshotSummary {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            id: snapshot.id,
            user_id: snapshot.user_id,
            name: snapshot.name.clone(),
            kind: snapshot.kind,
            created_at: snapshot.created_at,
            size_bytes: snapshot.size_bytes,
            counts: snapshot.counts.clone(),
        }
    }
}
