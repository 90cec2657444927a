//! Axum route handlers for the Snapshot API.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backup::archive::archive_artifact;
use crate::backup::service::RestoreReport;
use crate::errors::AppError;
use crate::models::snapshot::{SnapshotKind, SnapshotSummary};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateSnapshotRequest {
    pub user_id: Uuid,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AutomaticSnapshotResponse {
    pub created: bool,
    pub snapshot: Option<SnapshotSummary>,
}

#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    pub s3_key: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/snapshots
pub async fn handle_list_snapshots(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<SnapshotSummary>>, AppError> {
    Ok(Json(state.backup.list_snapshots(params.user_id).await?))
}

/// POST /api/v1/snapshots
pub async fn handle_create_snapshot(
    State(state): State<AppState>,
    Json(req): Json<CreateSnapshotRequest>,
) -> Result<(StatusCode, Json<SnapshotSummary>), AppError> {
    let summary = state
        .backup
        .create_snapshot(req.user_id, req.name, SnapshotKind::Manual)
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST /api/v1/snapshots/automatic
///
/// Called by the client shortly after load. Creates at most one snapshot per day.
pub async fn handle_automatic_snapshot(
    State(state): State<AppState>,
    Json(req): Json<UserRequest>,
) -> Result<Json<AutomaticSnapshotResponse>, AppError> {
    let snapshot = state.backup.create_automatic_snapshot(req.user_id).await?;
    Ok(Json(AutomaticSnapshotResponse {
        created: snapshot.is_some(),
        snapshot,
    }))
}

/// POST /api/v1/snapshots/import
///
/// Body is a previously downloaded backup file.
pub async fn handle_import_snapshot(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<SnapshotSummary>), AppError> {
    if body.is_empty() {
        return Err(AppError::Validation("Backup file is empty".to_string()));
    }
    let summary = state.backup.import_snapshot(params.user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /api/v1/snapshots/:id/download
pub async fn handle_download_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Response, AppError> {
    let download = state.backup.download_snapshot(params.user_id, id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download.file_name),
            ),
        ],
        download.bytes,
    )
        .into_response())
}

/// POST /api/v1/snapshots/:id/restore
///
/// Destructive: replaces all of the user's records with the snapshot's contents.
pub async fn handle_restore_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserRequest>,
) -> Result<Json<RestoreReport>, AppError> {
    Ok(Json(state.backup.restore_snapshot(req.user_id, id).await?))
}

/// POST /api/v1/snapshots/:id/archive
pub async fn handle_archive_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserRequest>,
) -> Result<Json<ArchiveResponse>, AppError> {
    let artifact = state.backup.load_artifact(req.user_id, id).await?;
    let s3_key = archive_artifact(&state.s3, &state.config.s3_bucket, &artifact).await?;
    Ok(Json(ArchiveResponse { s3_key }))
}

/// DELETE /api/v1/snapshots/:id
pub async fn handle_delete_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    state.backup.delete_snapshot(params.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_name_optional() {
        let json = serde_json::json!({ "user_id": Uuid::new_v4() });
        let req: CreateSnapshotRequest = serde_json::from_value(json).unwrap();
        assert!(req.name.is_none());
    }

    #[test]
    fn test_create_request_requires_user_id() {
        let result: Result<CreateSnapshotRequest, _> =
            serde_json::from_value(serde_json::json!({ "name": "x" }));
        assert!(result.is_err());
    }
}
