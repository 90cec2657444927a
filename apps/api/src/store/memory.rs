//! In-memory stores used by unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::records::{SnapshotTables, TableRows};
use crate::models::snapshot::{Snapshot, SnapshotSummary};
use crate::models::tables::Table;
use crate::models::user::User;
use crate::store::{RecordStore, SnapshotStore};

#[derive(Default)]
pub struct MemoryRecordStore {
    users: Mutex<HashMap<Uuid, User>>,
    data: Mutex<HashMap<Uuid, SnapshotTables>>,
    missing_tables: Mutex<HashSet<Table>>,
    failing_reads: Mutex<HashSet<Table>>,
    failing_insert: Mutex<Option<Table>>,
    pub capability_queries: AtomicUsize,
    pub replacements: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, display_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().unwrap().insert(
            id,
            User {
                id,
                display_name: display_name.to_string(),
                role: "patient".to_string(),
                preferences: serde_json::json!({}),
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn put(&self, user_id: Uuid, rows: TableRows) {
        self.data
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .set(rows);
    }

    pub fn contents(&self, user_id: Uuid) -> SnapshotTables {
        self.data
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear_user(&self, user_id: Uuid) {
        self.data.lock().unwrap().remove(&user_id);
    }

    /// Makes `table` absent from the schema.
    pub fn drop_table(&self, table: Table) {
        self.missing_tables.lock().unwrap().insert(table);
    }

    pub fn fail_reads_from(&self, table: Table) {
        self.failing_reads.lock().unwrap().insert(table);
    }

    pub fn fail_inserts_into(&self, table: Table) {
        *self.failing_insert.lock().unwrap() = Some(table);
    }

    /// The user whose `table` holds a row with primary key `id`.
    fn key_owner(&self, table: Table, id: Uuid) -> Option<Uuid> {
        self.data
            .lock()
            .unwrap()
            .iter()
            .find(|(_, tables)| tables.ids(table).contains(&id))
            .map(|(user, _)| *user)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn available_tables(&self) -> Result<HashSet<Table>, AppError> {
        self.capability_queries.fetch_add(1, Ordering::SeqCst);
        let missing = self.missing_tables.lock().unwrap();
        Ok(Table::ALL
            .into_iter()
            .filter(|t| !missing.contains(t))
            .collect())
    }

    async fn select_rows(&self, table: Table, user_id: Uuid) -> Result<TableRows, AppError> {
        if self.missing_tables.lock().unwrap().contains(&table) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "relation \"{table}\" does not exist"
            )));
        }
        if self.failing_reads.lock().unwrap().contains(&table) {
            return Err(AppError::Internal(anyhow::anyhow!("read from {table} failed")));
        }
        Ok(self.contents(user_id).rows(table))
    }

    async fn replace_user_data(
        &self,
        user_id: Uuid,
        tables: &SnapshotTables,
        present: &HashSet<Table>,
    ) -> Result<BTreeMap<Table, usize>, AppError> {
        let mut staged = self.contents(user_id);
        for table in Table::DELETE_ORDER.into_iter().filter(|t| present.contains(t)) {
            staged.set(TableRows::empty(table));
        }

        let failing = *self.failing_insert.lock().unwrap();
        let mut inserted = BTreeMap::new();
        for table in Table::insert_order() {
            let rows = tables.rows(table);
            if rows.is_empty() {
                continue;
            }
            if failing == Some(table) {
                return Err(AppError::Conflict(format!(
                    "insert into {table} violates a constraint"
                )));
            }
            if let Some(id) = tables
                .ids(table)
                .into_iter()
                .find(|id| self.key_owner(table, *id).is_some_and(|owner| owner != user_id))
            {
                return Err(AppError::Conflict(format!(
                    "duplicate key {id} in {table}"
                )));
            }
            inserted.insert(table, rows.len());
            staged.set(rows);
        }

        self.data.lock().unwrap().insert(user_id, staged);
        self.replacements.fetch_add(1, Ordering::SeqCst);
        Ok(inserted)
    }
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    payloads: Mutex<HashMap<(Uuid, Uuid), Snapshot>>,
    indexes: Mutex<HashMap<Uuid, Vec<SnapshotSummary>>>,
    markers: Mutex<HashMap<Uuid, NaiveDate>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload_count(&self, user_id: Uuid) -> usize {
        self.payloads
            .lock()
            .unwrap()
            .keys()
            .filter(|(u, _)| *u == user_id)
            .count()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(
        &self,
        snapshot: &Snapshot,
        index: &[SnapshotSummary],
        evicted: &[Uuid],
    ) -> Result<(), AppError> {
        let mut payloads = self.payloads.lock().unwrap();
        payloads.insert((snapshot.user_id, snapshot.id), snapshot.clone());
        for id in evicted {
            payloads.remove(&(snapshot.user_id, *id));
        }
        self.indexes
            .lock()
            .unwrap()
            .insert(snapshot.user_id, index.to_vec());
        Ok(())
    }

    async fn load(&self, user_id: Uuid, snapshot_id: Uuid) -> Result<Option<Snapshot>, AppError> {
        Ok(self
            .payloads
            .lock()
            .unwrap()
            .get(&(user_id, snapshot_id))
            .cloned())
    }

    async fn index(&self, user_id: Uuid) -> Result<Vec<SnapshotSummary>, AppError> {
        Ok(self
            .indexes
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove(
        &self,
        user_id: Uuid,
        snapshot_id: Uuid,
        index: &[SnapshotSummary],
    ) -> Result<(), AppError> {
        self.payloads.lock().unwrap().remove(&(user_id, snapshot_id));
        self.indexes.lock().unwrap().insert(user_id, index.to_vec());
        Ok(())
    }

    async fn last_automatic_run(&self, user_id: Uuid) -> Result<Option<NaiveDate>, AppError> {
        Ok(self.markers.lock().unwrap().get(&user_id).copied())
    }

    async fn mark_automatic_run(&self, user_id: Uuid, date: NaiveDate) -> Result<(), AppError> {
        self.markers.lock().unwrap().insert(user_id, date);
        Ok(())
    }
}
