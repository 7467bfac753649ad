//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the BCF service is unreachable
    pub status: String,
    pub module: String,
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub service: ServiceHealth,
}

/// Reachability of the external BCF service
#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let service = match state.inspector.probe().await {
        Ok(()) => ServiceHealth {
            reachable: true,
            error: None,
        },
        Err(e) => ServiceHealth {
            reachable: false,
            error: Some(e.to_string()),
        },
    };

    Json(HealthResponse {
        status: if service.reachable { "ok" } else { "degraded" }.to_string(),
        module: "bcfhub-ui".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        service,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
