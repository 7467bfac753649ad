//! Aggregate issue list and selection

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bcfhub_common::Issue;
use serde::{Deserialize, Serialize};

use crate::error::{HubError, HubResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IssueQuery {
    /// Restrict to one archive's issues
    pub archive: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IssueListResponse {
    pub count: usize,
    pub issues: Vec<Issue>,
}

/// Body of PUT /api/selection
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub archive: String,
    pub guid: String,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub selection: Option<Issue>,
    /// False once the selected issue's archive has been removed or re-registered
    pub source_registered: bool,
}

impl SelectionResponse {
    async fn current(state: &AppState) -> Self {
        match state.workspace.selection_view().await {
            Some(view) => Self {
                selection: Some(view.issue),
                source_registered: view.source_registered,
            },
            None => Self {
                selection: None,
                source_registered: false,
            },
        }
    }
}

/// GET /api/issues
pub async fn list_issues(
    State(state): State<AppState>,
    Query(query): Query<IssueQuery>,
) -> HubResult<Json<IssueListResponse>> {
    let issues = match query.archive {
        Some(archive) => state
            .workspace
            .issues_of(&archive)
            .await
            .ok_or_else(|| HubError::NotFound(format!("archive '{}'", archive)))?,
        None => state.workspace.aggregate().await.to_vec(),
    };

    Ok(Json(IssueListResponse {
        count: issues.len(),
        issues,
    }))
}

/// GET /api/selection
pub async fn get_selection(State(state): State<AppState>) -> Json<SelectionResponse> {
    Json(SelectionResponse::current(&state).await)
}

/// PUT /api/selection
pub async fn put_selection(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> HubResult<Json<SelectionResponse>> {
    state
        .workspace
        .select_issue(&request.archive, &request.guid)
        .await?;
    Ok(Json(SelectionResponse::current(&state).await))
}

/// DELETE /api/selection
pub async fn clear_selection(State(state): State<AppState>) -> StatusCode {
    state.workspace.clear_selection().await;
    StatusCode::NO_CONTENT
}

pub fn issue_routes() -> Router<AppState> {
    Router::new()
        .route("/api/issues", get(list_issues))
        .route(
            "/api/selection",
            get(get_selection).put(put_selection).delete(clear_selection),
        )
}
