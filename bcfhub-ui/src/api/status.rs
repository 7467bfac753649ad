//! Busy signals and workspace counts

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::busy::BusyStatus;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub busy: BusyStatus,
    pub archive_count: usize,
    pub issue_count: usize,
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        busy: state.busy.status(),
        archive_count: state.workspace.archive_count().await,
        issue_count: state.workspace.aggregate().await.len(),
    })
}

pub fn status_routes() -> Router<AppState> {
    Router::new().route("/api/status", get(get_status))
}
