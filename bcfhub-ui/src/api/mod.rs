//! HTTP API handlers for bcfhub-ui
//!
//! Thin adapter over the workspace, coordinator and merge orchestrator for
//! the presentation layer: JSON in and out, SSE for change notifications.

pub mod archives;
pub mod health;
pub mod issues;
pub mod merge;
pub mod sse;
pub mod status;

pub use archives::archive_routes;
pub use health::health_routes;
pub use issues::issue_routes;
pub use merge::merge_routes;
pub use sse::event_routes;
pub use status::status_routes;
