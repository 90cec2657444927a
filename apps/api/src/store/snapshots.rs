use async_trait::async_trait;
use chrono::NaiveDate;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::snapshot::{Snapshot, SnapshotSummary};
use crate::store::SnapshotStore;

const MARKER_FORMAT: &str = "%Y-%m-%d";

fn payload_key(user_id: Uuid, snapshot_id: Uuid) -> String {
    format!("snapshots:{user_id}:{snapshot_id}")
}

fn index_key(user_id: Uuid) -> String {
    format!("snapshots:{user_id}:index")
}

fn marker_key(user_id: Uuid) -> String {
    format!("snapshots:{user_id}:auto")
}

/// `SnapshotStore` over Redis. Multi-key writes go through MULTI/EXEC so the payload and the
/// summary list never disagree.
#[derive(Clone)]
pub struct RedisSnapshotStore {
    conn: MultiplexedConnection,
}

impl RedisSnapshotStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SnapshotStore for RedisSnapshotStore {
    async fn save(
        &self,
        snapshot: &Snapshot,
        index: &[SnapshotSummary],
        evicted: &[Uuid],
    ) -> Result<(), AppError> {
        let payload = serde_json::to_string(snapshot)?;
        let index_json = serde_json::to_string(index)?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .set(payload_key(snapshot.user_id, snapshot.id), payload)
            .ignore()
            .set(index_key(snapshot.user_id), index_json)
            .ignore();
        for id in evicted {
            pipe.del(payload_key(snapshot.user_id, *id)).ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn load(&self, user_id: Uuid, snapshot_id: Uuid) -> Result<Option<Snapshot>, AppError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(payload_key(user_id, snapshot_id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn index(&self, user_id: Uuid) -> Result<Vec<SnapshotSummary>, AppError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(index_key(user_id)).await?;
        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn remove(
        &self,
        user_id: Uuid,
        snapshot_id: Uuid,
        index: &[SnapshotSummary],
    ) -> Result<(), AppError> {
        let index_json = serde_json::to_string(index)?;

        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .del(payload_key(user_id, snapshot_id))
            .ignore()
            .set(index_key(user_id), index_json)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn last_automatic_run(&self, user_id: Uuid) -> Result<Option<NaiveDate>, AppError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(marker_key(user_id)).await?;
        // An unreadable marker is treated as "never ran"; the name check still guards the day.
        Ok(raw.and_then(|s| NaiveDate::parse_from_str(&s, MARKER_FORMAT).ok()))
    }

    async fn mark_automatic_run(&self, user_id: Uuid, date: NaiveDate) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(marker_key(user_id), date.format(MARKER_FORMAT).to_string())
            .await?;
        Ok(())
    }
}
