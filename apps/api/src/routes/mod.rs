pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::backup::handlers;
use crate::report::handlers as report_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let import_limit = state.config.max_import_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        // Snapshot API
        .route(
            "/api/v1/snapshots",
            get(handlers::handle_list_snapshots).post(handlers::handle_create_snapshot),
        )
        .route(
            "/api/v1/snapshots/automatic",
            post(handlers::handle_automatic_snapshot),
        )
        .route(
            "/api/v1/snapshots/import",
            post(handlers::handle_import_snapshot).layer(DefaultBodyLimit::max(import_limit)),
        )
        .route(
            "/api/v1/snapshots/:id",
            delete(handlers::handle_delete_snapshot),
        )
        .route(
            "/api/v1/snapshots/:id/download",
            get(handlers::handle_download_snapshot),
        )
        .route(
            "/api/v1/snapshots/:id/restore",
            post(handlers::handle_restore_snapshot),
        )
        .route(
            "/api/v1/snapshots/:id/archive",
            post(handlers::handle_archive_snapshot),
        )
        // Report API
        .route("/api/v1/reports", post(report_handlers::handle_generate_report))
        .with_state(state)
}
