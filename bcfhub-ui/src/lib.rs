//! bcfhub-ui library
//!
//! Session service that collects BCF archives, inspects each one through an
//! external service, and keeps a single ordered view of every extracted
//! issue while inspections run concurrently and settle in any order.
//!
//! Merging is delegated to the same external service; this crate only
//! snapshots the registered archives and hands back the artifact.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use bcfhub_common::events::EventBus;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod aggregate;
pub mod api;
pub mod busy;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod disposition;
pub mod error;
pub mod merge;
pub mod registry;
pub mod selection;
pub mod validation;
pub mod workspace;

#[cfg(test)]
mod test_support;

pub use crate::error::{HubError, HubResult};

use crate::busy::BusySignals;
use crate::client::{InspectionService, MergeService};
use crate::coordinator::InspectionCoordinator;
use crate::merge::MergeOrchestrator;
use crate::validation::ArchiveLimits;
use crate::workspace::Workspace;

/// Upper bound on archives carried by one upload request
const MAX_ARCHIVES_PER_UPLOAD: u64 = 32;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub workspace: Workspace,
    pub coordinator: InspectionCoordinator,
    pub merger: MergeOrchestrator,
    pub busy: BusySignals,
    /// Used by the health check to probe the external service
    pub inspector: Arc<dyn InspectionService>,
    pub event_bus: EventBus,
    pub limits: ArchiveLimits,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        event_bus: EventBus,
        inspector: Arc<dyn InspectionService>,
        merge_service: Arc<dyn MergeService>,
        limits: ArchiveLimits,
    ) -> Self {
        let workspace = Workspace::new(event_bus.clone());
        let busy = BusySignals::with_event_bus(event_bus.clone());
        let coordinator =
            InspectionCoordinator::new(workspace.clone(), Arc::clone(&inspector), busy.clone());
        let merger = MergeOrchestrator::new(merge_service, busy.clone(), event_bus.clone());

        Self {
            workspace,
            coordinator,
            merger,
            busy,
            inspector,
            event_bus,
            limits,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .limits
        .max_bytes
        .saturating_mul(MAX_ARCHIVES_PER_UPLOAD)
        .try_into()
        .unwrap_or(usize::MAX);

    Router::new()
        .merge(api::health_routes())
        .merge(api::archive_routes())
        .merge(api::issue_routes())
        .merge(api::merge_routes())
        .merge(api::status_routes())
        .merge(api::event_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
