//! External BCF service client
//!
//! Inspection and merging run in an external service; this module defines
//! the request/response contract as traits and provides the HTTP
//! implementation used in production.

use async_trait::async_trait;
use bcfhub_common::bcf::InspectionReport;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use thiserror::Error;

use crate::registry::ArchivePayload;

const USER_AGENT: &str = concat!("bcfhub-ui/", env!("CARGO_PKG_VERSION"));

/// External service client errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Service error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Raw merge service response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResponse {
    pub bytes: Vec<u8>,
    /// `Content-Disposition` header value, if the service sent one
    pub content_disposition: Option<String>,
}

/// Extracts issue records from one archive
#[async_trait]
pub trait InspectionService: Send + Sync {
    async fn inspect(&self, archive: &ArchivePayload) -> Result<InspectionReport, ServiceError>;

    /// Check that the service is reachable
    async fn probe(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Combines two or more archives into one
#[async_trait]
pub trait MergeService: Send + Sync {
    async fn merge(&self, archives: &[ArchivePayload]) -> Result<MergeResponse, ServiceError>;
}

/// HTTP client for the BCF service
///
/// Endpoints:
/// - `POST /bcf/inspect` (multipart field `file`)
/// - `POST /bcf/merge` (one multipart field `files` per archive)
/// - `GET /healthz`
pub struct BcfServiceClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl BcfServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<reqwest::Response, ServiceError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "Calling BCF service");

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        ensure_success(response).await
    }
}

fn archive_part(archive: &ArchivePayload) -> Result<Part, ServiceError> {
    Part::bytes(archive.content.as_bytes().to_vec())
        .file_name(archive.name.clone())
        .mime_str("application/octet-stream")
        .map_err(|e| ServiceError::Network(e.to_string()))
}

/// Turn a non-success response into [`ServiceError::Api`]
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string());

    Err(ServiceError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Extract a human-readable message from an error body
///
/// Understands `{"detail": "..."}` (string or structured detail); any other
/// non-empty body is returned trimmed.
pub fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match value.get("detail") {
            Some(serde_json::Value::String(detail)) => return Some(detail.clone()),
            Some(serde_json::Value::Null) | None => {}
            Some(other) => return Some(other.to_string()),
        }
    }

    Some(trimmed.to_string())
}

#[async_trait]
impl InspectionService for BcfServiceClient {
    async fn inspect(&self, archive: &ArchivePayload) -> Result<InspectionReport, ServiceError> {
        let form = Form::new().part("file", archive_part(archive)?);
        let response = self.post_form("/bcf/inspect", form).await?;

        let report: InspectionReport = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        tracing::info!(
            archive = %archive.name,
            topics = report.topics.len(),
            "Inspection service answered"
        );

        Ok(report)
    }

    async fn probe(&self) -> Result<(), ServiceError> {
        let response = self
            .http_client
            .get(self.url("/healthz"))
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        ensure_success(response).await.map(|_| ())
    }
}

#[async_trait]
impl MergeService for BcfServiceClient {
    async fn merge(&self, archives: &[ArchivePayload]) -> Result<MergeResponse, ServiceError> {
        let mut form = Form::new();
        for archive in archives {
            form = form.part("files", archive_part(archive)?);
        }

        let response = self.post_form("/bcf/merge", form).await?;

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        tracing::info!(
            archives = archives.len(),
            size_bytes = bytes.len(),
            "Merge service answered"
        );

        Ok(MergeResponse {
            bytes: bytes.to_vec(),
            content_disposition,
        })
    }
}
