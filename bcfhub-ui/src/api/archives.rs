//! Archive upload, listing and removal

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::coordinator::InspectionOutcome;
use crate::error::{HubError, HubResult};
use crate::registry::ArchiveContent;
use crate::validation::validate_upload;
use crate::workspace::ArchiveSummary;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// Respond only after every inspection in the request has settled
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Serialize)]
pub struct AcceptedArchive {
    pub name: String,
    pub size_bytes: u64,
    pub replaced: bool,
}

/// Settled inspection as reported by `?wait=true` uploads
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SettledInspection {
    Inspected { archive: String, issue_count: usize },
    Discarded { archive: String },
    Failed { archive: String, message: String },
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub accepted: Vec<AcceptedArchive>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspections: Option<Vec<SettledInspection>>,
}

#[derive(Debug, Serialize)]
pub struct ArchiveListResponse {
    pub archives: Vec<ArchiveSummary>,
}

/// POST /api/archives
///
/// Multipart upload, one file part per archive. Every file is validated
/// before any is registered; a single rejection fails the whole request.
pub async fn upload_archives(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> HubResult<Response> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HubError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| HubError::BadRequest(format!("failed to read '{}': {}", name, e)))?;

        validate_upload(&name, bytes.len() as u64, state.limits)?;
        files.push((name, ArchiveContent::new(bytes.to_vec())));
    }

    if files.is_empty() {
        return Err(HubError::BadRequest("no archive files in request".to_string()));
    }

    info!(count = files.len(), "Archives uploaded");

    let mut accepted = Vec::with_capacity(files.len());
    let mut tickets = Vec::with_capacity(files.len());
    for (name, content) in files {
        let size_bytes = content.len();
        let ticket = state.coordinator.submit(&name, content).await;
        accepted.push(AcceptedArchive {
            name,
            size_bytes,
            replaced: ticket.replaced,
        });
        tickets.push(ticket);
    }

    if !query.wait {
        let body = UploadResponse {
            accepted,
            inspections: None,
        };
        return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
    }

    let mut inspections = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        let report = match ticket.outcome().await {
            Ok(InspectionOutcome::Applied {
                archive,
                issue_count,
            }) => SettledInspection::Inspected {
                archive,
                issue_count,
            },
            Ok(InspectionOutcome::Discarded { archive }) => SettledInspection::Discarded { archive },
            Err(HubError::Inspection { archive, message }) => {
                SettledInspection::Failed { archive, message }
            }
            Err(e) => return Err(e),
        };
        inspections.push(report);
    }

    let body = UploadResponse {
        accepted,
        inspections: Some(inspections),
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// GET /api/archives
pub async fn list_archives(State(state): State<AppState>) -> Json<ArchiveListResponse> {
    Json(ArchiveListResponse {
        archives: state.workspace.archives().await,
    })
}

/// DELETE /api/archives/:name
pub async fn remove_archive(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> HubResult<StatusCode> {
    if state.workspace.remove(&name).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HubError::NotFound(format!("archive '{}'", name)))
    }
}

/// DELETE /api/archives
pub async fn clear_archives(State(state): State<AppState>) -> StatusCode {
    state.workspace.clear().await;
    StatusCode::NO_CONTENT
}

pub fn archive_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/archives",
            get(list_archives).post(upload_archives).delete(clear_archives),
        )
        .route("/api/archives/:name", delete(remove_archive))
}
