//! Merge trigger

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

use crate::disposition::attachment_header;
use crate::error::{HubError, HubResult};
use crate::AppState;

/// POST /api/merge
///
/// Merges every registered archive in registration order and returns the
/// artifact as a download. Inspections still in flight are not waited for.
/// Responds 409 while another merge is outstanding.
pub async fn merge_archives(State(state): State<AppState>) -> HubResult<Response> {
    let payloads = state.workspace.payloads().await;
    let merged = state.merger.try_merge(payloads).await?;

    let disposition = HeaderValue::from_str(&attachment_header(&merged.file_name))
        .map_err(|e| HubError::Internal(format!("invalid file name header: {}", e)))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        merged.bytes,
    )
        .into_response())
}

pub fn merge_routes() -> Router<AppState> {
    Router::new().route("/api/merge", post(merge_archives))
}
