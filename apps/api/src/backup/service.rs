//! The snapshot builder: create, list, restore, delete, download, and import.
//!
//! Reads are best-effort per table: a table missing from the schema, or a read that fails,
//! contributes an empty list instead of failing the backup. Restore is all-or-nothing and
//! goes through `RecordStore::replace_user_data`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::{OnceCell, OwnedMutexGuard};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backup::artifact::SnapshotArtifact;
use crate::backup::retention::apply_retention;
use crate::backup::summary::{compute_counts, payload_size};
use crate::errors::AppError;
use crate::models::records::{SnapshotTables, TableRows};
use crate::models::snapshot::{Snapshot, SnapshotKind, SnapshotSummary};
use crate::models::tables::Table;
use crate::models::user::User;
use crate::store::{RecordStore, SnapshotStore};

pub const DEFAULT_RETENTION: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub snapshot_id: Uuid,
    pub restored_at: DateTime<Utc>,
    pub tables: BTreeMap<Table, usize>,
    pub total_rows: usize,
}

/// A serialized snapshot ready to hand to the client as a file.
#[derive(Debug, Clone)]
pub struct SnapshotDownload {
    pub file_name: String,
    pub bytes: bytes::Bytes,
}

pub struct BackupService {
    records: Arc<dyn RecordStore>,
    snapshots: Arc<dyn SnapshotStore>,
    retention: usize,
    schema: OnceCell<HashSet<Table>>,
    user_locks: UserLocks,
}

type UserLocks = Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>;

/// Held for the duration of one user's operation. Dropping it releases the lock and forgets
/// the user's entry once nobody else is waiting on it.
struct UserLockGuard<'a> {
    locks: &'a UserLocks,
    user_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLockGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.user_id);
        }
    }
}

pub fn default_name(kind: SnapshotKind, at: DateTime<Utc>) -> String {
    format!("{} backup {}", kind.label(), at.format("%Y-%m-%d %H:%M:%S UTC"))
}

fn day_tag(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl BackupService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        snapshots: Arc<dyn SnapshotStore>,
        retention: usize,
    ) -> Self {
        Self {
            records,
            snapshots,
            retention: retention.max(1),
            schema: OnceCell::new(),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Tables present in the current schema, queried once per service lifetime.
    async fn schema(&self) -> Result<&HashSet<Table>, AppError> {
        self.schema
            .get_or_try_init(|| async {
                let tables = self.records.available_tables().await?;
                let missing: Vec<_> = Table::ALL
                    .iter()
                    .filter(|t| !tables.contains(*t))
                    .map(|t| t.as_str())
                    .collect();
                if !missing.is_empty() {
                    warn!("Tables absent from schema, excluded from backups: {missing:?}");
                }
                Ok::<_, AppError>(tables)
            })
            .await
    }

    /// Operations for one user run one at a time.
    async fn lock_user(&self, user_id: Uuid) -> UserLockGuard<'_> {
        let lock = {
            let mut locks = self.user_locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(user_id).or_default())
        };
        UserLockGuard {
            locks: &self.user_locks,
            user_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.records
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
    }

    /// Reads every present table concurrently.
    async fn collect_tables(&self, user_id: Uuid) -> Result<SnapshotTables, AppError> {
        let present = self.schema().await?;
        let mut reads = JoinSet::new();
        for table in Table::ALL.into_iter().filter(|t| present.contains(t)) {
            let records = Arc::clone(&self.records);
            reads.spawn(async move { (table, records.select_rows(table, user_id).await) });
        }

        let mut tables = SnapshotTables::default();
        while let Some(joined) = reads.join_next().await {
            match joined {
                Ok((_, Ok(rows))) => {
                    debug!("Read {} rows from {} for user {user_id}", rows.len(), rows.table());
                    tables.set(rows);
                }
                Ok((table, Err(e))) => {
                    warn!("Reading {table} for user {user_id} failed, backing up as empty: {e}");
                    tables.set(TableRows::empty(table));
                }
                Err(e) => warn!("Table read task for user {user_id} aborted: {e}"),
            }
        }
        Ok(tables)
    }

    /// Stores `snapshot` and applies retention to the user's list.
    async fn store(&self, snapshot: &Snapshot) -> Result<SnapshotSummary, AppError> {
        let summary = SnapshotSummary::from(snapshot);
        let existing = self.snapshots.index(snapshot.user_id).await?;
        let (index, evicted) = apply_retention(existing, summary.clone(), self.retention);

        self.snapshots.save(snapshot, &index, &evicted).await?;
        if !evicted.is_empty() {
            info!(
                "Evicted {} snapshot(s) for user {}: {evicted:?}",
                evicted.len(),
                snapshot.user_id
            );
        }
        Ok(summary)
    }

    async fn create_locked(
        &self,
        user_id: Uuid,
        name: Option<String>,
        kind: SnapshotKind,
        created_at: DateTime<Utc>,
    ) -> Result<SnapshotSummary, AppError> {
        self.require_user(user_id).await?;
        let tables = self.collect_tables(user_id).await?;

        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_name(kind, created_at));

        let snapshot = Snapshot {
            id: Uuid::new_v4(),
            user_id,
            name,
            kind,
            created_at,
            size_bytes: payload_size(&tables)?,
            counts: compute_counts(&tables),
            tables,
        };
        let summary = self.store(&snapshot).await?;

        info!(
            "Created {:?} snapshot {} for user {user_id}: {} rows, {} bytes",
            kind, snapshot.id, summary.counts.total, summary.size_bytes
        );
        Ok(summary)
    }

    pub async fn create_snapshot(
        &self,
        user_id: Uuid,
        name: Option<String>,
        kind: SnapshotKind,
    ) -> Result<SnapshotSummary, AppError> {
        let _guard = self.lock_user(user_id).await;
        self.create_locked(user_id, name, kind, Utc::now()).await
    }

    /// Summaries for the user, newest first.
    pub async fn list_snapshots(&self, user_id: Uuid) -> Result<Vec<SnapshotSummary>, AppError> {
        self.snapshots.index(user_id).await
    }

    /// Replaces all of the user's data with the snapshot's contents.
    pub async fn restore_snapshot(
        &self,
        user_id: Uuid,
        snapshot_id: Uuid,
    ) -> Result<RestoreReport, AppError> {
        let _guard = self.lock_user(user_id).await;

        self.require_user(user_id).await?;
        let snapshot = self
            .snapshots
            .load(user_id, snapshot_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Snapshot {snapshot_id} not found")))?;

        let present = self.schema().await?;
        let unsupported: Vec<_> = snapshot
            .tables
            .populated_tables()
            .into_iter()
            .filter(|t| !present.contains(t))
            .map(|t| t.as_str())
            .collect();
        if !unsupported.is_empty() {
            return Err(AppError::Validation(format!(
                "Snapshot {snapshot_id} has rows for tables missing from the schema: {}",
                unsupported.join(", ")
            )));
        }

        info!("Restoring snapshot {snapshot_id} for user {user_id}");
        let tables = self
            .records
            .replace_user_data(user_id, &snapshot.tables, present)
            .await?;
        let total_rows: usize = tables.values().sum();
        info!("Restored snapshot {snapshot_id} for user {user_id}: {total_rows} rows");

        Ok(RestoreReport {
            snapshot_id,
            restored_at: Utc::now(),
            tables,
            total_rows,
        })
    }

    /// Removes a snapshot and its summary entry. Absent snapshots are not an error.
    pub async fn delete_snapshot(&self, user_id: Uuid, snapshot_id: Uuid) -> Result<(), AppError> {
        let _guard = self.lock_user(user_id).await;

        let mut index = self.snapshots.index(user_id).await?;
        index.retain(|s| s.id != snapshot_id);
        self.snapshots.remove(user_id, snapshot_id, &index).await?;
        info!("Deleted snapshot {snapshot_id} for user {user_id}");
        Ok(())
    }

    pub async fn load_artifact(
        &self,
        user_id: Uuid,
        snapshot_id: Uuid,
    ) -> Result<SnapshotArtifact, AppError> {
        let snapshot = self
            .snapshots
            .load(user_id, snapshot_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Snapshot {snapshot_id} not found")))?;
        Ok(SnapshotArtifact::new(snapshot))
    }

    pub async fn download_snapshot(
        &self,
        user_id: Uuid,
        snapshot_id: Uuid,
    ) -> Result<SnapshotDownload, AppError> {
        let artifact = self.load_artifact(user_id, snapshot_id).await?;
        Ok(SnapshotDownload {
            file_name: artifact.file_name(),
            bytes: artifact.to_bytes()?,
        })
    }

    /// At most one automatic snapshot per user per calendar day (UTC).
    /// Returns `None` when today's snapshot already exists.
    pub async fn create_automatic_snapshot(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SnapshotSummary>, AppError> {
        let _guard = self.lock_user(user_id).await;

        let now = Utc::now();
        let today = now.date_naive();
        if self.snapshots.last_automatic_run(user_id).await? == Some(today) {
            return Ok(None);
        }

        let tag = day_tag(today);
        let already = self
            .snapshots
            .index(user_id)
            .await?
            .iter()
            .any(|s| s.kind == SnapshotKind::Automatic && s.name.contains(&tag));
        if already {
            self.snapshots.mark_automatic_run(user_id, today).await?;
            return Ok(None);
        }

        let summary = self
            .create_locked(user_id, None, SnapshotKind::Automatic, now)
            .await?;
        self.snapshots.mark_automatic_run(user_id, today).await?;
        Ok(Some(summary))
    }

    /// Stores an uploaded artifact as a new manual snapshot owned by `user_id`.
    pub async fn import_snapshot(
        &self,
        user_id: Uuid,
        bytes: &[u8],
    ) -> Result<SnapshotSummary, AppError> {
        let artifact = SnapshotArtifact::parse(bytes)?;

        let _guard = self.lock_user(user_id).await;
        self.require_user(user_id).await?;

        let mut tables = artifact.snapshot.tables;
        if artifact.snapshot.user_id != user_id {
            tables.reassign_user(user_id);
        }

        let snapshot = Snapshot {
            id: Uuid::new_v4(),
            user_id,
            name: format!("Imported: {}", artifact.snapshot.name),
            kind: SnapshotKind::Manual,
            created_at: Utc::now(),
            size_bytes: payload_size(&tables)?,
            counts: compute_counts(&tables),
            tables,
        };
        let summary = self.store(&snapshot).await?;
        info!(
            "Imported snapshot {} for user {user_id} from file exported {}",
            snapshot.id, artifact.exported_at
        );
        Ok(summary)
    }
}
