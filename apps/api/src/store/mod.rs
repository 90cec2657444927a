//! Storage seams for the backup service.
//!
//! `RecordStore` is the per-user relational data being backed up; `SnapshotStore` is the
//! key-value store holding snapshot payloads and their summary lists. Both are carried as
//! trait objects so tests can swap in the in-memory fakes.

pub mod postgres;
pub mod snapshots;

#[cfg(test)]
pub mod memory;

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::records::{SnapshotTables, TableRows};
use crate::models::snapshot::{Snapshot, SnapshotSummary};
use crate::models::tables::Table;
use crate::models::user::User;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    /// Which of the known tables exist in the current schema.
    async fn available_tables(&self) -> Result<HashSet<Table>, AppError>;

    /// Every row of `table` owned by `user_id`.
    async fn select_rows(&self, table: Table, user_id: Uuid) -> Result<TableRows, AppError>;

    /// Deletes the user's rows from every table in `present` (children first) and inserts the
    /// snapshot contents (parents first), as one unit. On error nothing is changed.
    /// Returns the number of rows inserted per table.
    async fn replace_user_data(
        &self,
        user_id: Uuid,
        tables: &SnapshotTables,
        present: &HashSet<Table>,
    ) -> Result<BTreeMap<Table, usize>, AppError>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Writes the payload, replaces the user's summary list with `index`, and drops the
    /// payloads of `evicted`, all together.
    async fn save(
        &self,
        snapshot: &Snapshot,
        index: &[SnapshotSummary],
        evicted: &[Uuid],
    ) -> Result<(), AppError>;

    async fn load(&self, user_id: Uuid, snapshot_id: Uuid) -> Result<Option<Snapshot>, AppError>;

    /// The user's summary list as last saved, newest first.
    async fn index(&self, user_id: Uuid) -> Result<Vec<SnapshotSummary>, AppError>;

    /// Drops one payload and replaces the summary list with `index`.
    async fn remove(
        &self,
        user_id: Uuid,
        snapshot_id: Uuid,
        index: &[SnapshotSummary],
    ) -> Result<(), AppError>;

    async fn last_automatic_run(&self, user_id: Uuid) -> Result<Option<NaiveDate>, AppError>;

    async fn mark_automatic_run(&self, user_id: Uuid, date: NaiveDate) -> Result<(), AppError>;
}
