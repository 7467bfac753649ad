//! Inspection coordinator
//!
//! Registers each uploaded archive and launches exactly one inspection task
//! for it. Tasks run concurrently and may settle in any order; each applies
//! its result through the workspace's guarded apply, keyed by archive name
//! and registration generation, so a late result for a removed or replaced
//! archive is dropped.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::busy::{BusySignals, OperationKind};
use crate::client::InspectionService;
use crate::error::{HubError, HubResult};
use crate::registry::{ApplyOutcome, ArchiveContent, Generation, Registration};
use crate::workspace::Workspace;

/// How a settled inspection was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectionOutcome {
    /// Issues attached to the archive
    Applied { archive: String, issue_count: usize },
    /// Archive was removed or replaced before the inspection settled
    Discarded { archive: String },
}

/// A launched inspection
///
/// Dropping the ticket does not cancel the task; awaiting
/// [`InspectionTicket::outcome`] reports how it settled.
pub struct InspectionTicket {
    pub archive: String,
    pub generation: Generation,
    pub replaced: bool,
    handle: JoinHandle<HubResult<InspectionOutcome>>,
}

impl InspectionTicket {
    /// Wait for the inspection to settle
    ///
    /// Service failures come back as [`HubError::Inspection`].
    pub async fn outcome(self) -> HubResult<InspectionOutcome> {
        self.handle
            .await
            .map_err(|e| HubError::Internal(format!("inspection task failed: {}", e)))?
    }
}

#[derive(Clone)]
pub struct InspectionCoordinator {
    workspace: Workspace,
    service: Arc<dyn InspectionService>,
    busy: BusySignals,
}

impl InspectionCoordinator {
    pub fn new(workspace: Workspace, service: Arc<dyn InspectionService>, busy: BusySignals) -> Self {
        Self {
            workspace,
            service,
            busy,
        }
    }

    /// Register `name` and start its inspection
    ///
    /// Re-submitting an existing name replaces the entry; any inspection
    /// still running for the previous entry will be discarded when it
    /// settles.
    pub async fn submit(&self, name: &str, content: ArchiveContent) -> InspectionTicket {
        let registration = self.workspace.register(name, content).await;
        self.launch(registration)
    }

    /// Start the inspection task for an existing registration
    pub fn launch(&self, registration: Registration) -> InspectionTicket {
        // Counted before spawning so the busy signal is raised by the time
        // the caller regains control.
        let guard = self.busy.begin(OperationKind::Inspection);
        let coordinator = self.clone();

        let archive = registration.name.clone();
        let generation = registration.generation;
        let replaced = registration.replaced;

        info!(archive = %archive, generation = %generation, "Inspection submitted");

        let handle = tokio::spawn(async move {
            let _guard = guard;
            coordinator.inspect(registration).await
        });

        InspectionTicket {
            archive,
            generation,
            replaced,
            handle,
        }
    }

    async fn inspect(&self, registration: Registration) -> HubResult<InspectionOutcome> {
        let payload = registration.payload();
        let result = self.service.inspect(&payload).await;
        let name = registration.name;
        let generation = registration.generation;

        match result {
            Ok(report) => {
                let issues = report.into_issues(&name);
                let issue_count = issues.len();
                match self
                    .workspace
                    .apply_inspection_result(&name, generation, issues)
                    .await
                {
                    ApplyOutcome::Applied => Ok(InspectionOutcome::Applied {
                        archive: name,
                        issue_count,
                    }),
                    ApplyOutcome::Stale => Ok(InspectionOutcome::Discarded { archive: name }),
                }
            }
            Err(e) => {
                let message = e.to_string();
                match self
                    .workspace
                    .record_inspection_failure(&name, generation, &message)
                    .await
                {
                    ApplyOutcome::Applied => Err(HubError::Inspection {
                        archive: name,
                        message,
                    }),
                    ApplyOutcome::Stale => {
                        debug!(archive = %name, error = %message, "Stale inspection failure dropped");
                        Ok(InspectionOutcome::Discarded { archive: name })
                    }
                }
            }
        }
    }

    pub fn busy(&self) -> &BusySignals {
        &self.busy
    }
}
