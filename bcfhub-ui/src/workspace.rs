//! Session workspace: registry, aggregate and selection behind one lock
//!
//! Every mutation updates the registry and recomputes the aggregate while
//! holding the write lock, so no reader ever sees a registry change that is
//! not yet reflected in the aggregate. Events are published after the lock
//! is released.

use bcfhub_common::events::{EventBus, HubEvent};
use bcfhub_common::Issue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::aggregate::{aggregate, find_issue};
use crate::error::{HubError, HubResult};
use crate::registry::{
    ApplyOutcome, Archive, ArchiveContent, ArchivePayload, Generation, Registration, Registry,
};
use crate::selection::Selection;

/// Inspection state of one archive as shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InspectionStatus {
    Pending,
    Inspected,
    Failed { message: String },
}

/// Read-only view of one registered archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub name: String,
    pub size_bytes: u64,
    pub inspected: bool,
    pub inspection: InspectionStatus,
    pub issue_count: usize,
    pub registered_at: DateTime<Utc>,
}

/// Selected issue as shown to clients
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionView {
    pub issue: Issue,
    pub source_registered: bool,
}

#[derive(Default)]
struct WorkspaceState {
    registry: Registry,
    aggregate: Arc<Vec<Issue>>,
    selection: Selection,
    /// Last inspection failure per archive name, for the current generation
    failures: HashMap<String, String>,
}

impl WorkspaceState {
    fn refresh(&mut self) {
        self.aggregate = Arc::new(aggregate(&self.registry));
    }

    fn summary(&self, archive: &Archive) -> ArchiveSummary {
        let inspection = if archive.inspected {
            InspectionStatus::Inspected
        } else if let Some(message) = self.failures.get(&archive.name) {
            InspectionStatus::Failed {
                message: message.clone(),
            }
        } else {
            InspectionStatus::Pending
        };

        ArchiveSummary {
            name: archive.name.clone(),
            size_bytes: archive.content.len(),
            inspected: archive.inspected,
            inspection,
            issue_count: archive.issues.len(),
            registered_at: archive.registered_at,
        }
    }
}

/// Cloneable handle to the shared session state
#[derive(Clone)]
pub struct Workspace {
    state: Arc<RwLock<WorkspaceState>>,
    event_bus: EventBus,
}

impl Workspace {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            state: Arc::new(RwLock::new(WorkspaceState::default())),
            event_bus,
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Register `name` with a fresh placeholder entry (upsert)
    pub async fn register(&self, name: &str, content: ArchiveContent) -> Registration {
        let registration = {
            let mut state = self.state.write().await;
            let registration = state.registry.register(name, content);
            state.failures.remove(name);
            state.refresh();
            registration
        };

        info!(
            archive = %registration.name,
            generation = %registration.generation,
            size_bytes = registration.content.len(),
            replaced = registration.replaced,
            "Archive registered"
        );

        self.event_bus.emit_lossy(HubEvent::ArchiveRegistered {
            archive: registration.name.clone(),
            size_bytes: registration.content.len(),
            replaced: registration.replaced,
            timestamp: Utc::now(),
        });

        registration
    }

    /// Attach inspected issues to `name` if it is still registered as `generation`
    pub async fn apply_inspection_result(
        &self,
        name: &str,
        generation: Generation,
        issues: Vec<Issue>,
    ) -> ApplyOutcome {
        let issue_count = issues.len();
        let outcome = {
            let mut state = self.state.write().await;
            let outcome = state
                .registry
                .apply_inspection_result(name, generation, issues);
            if outcome == ApplyOutcome::Applied {
                state.failures.remove(name);
                state.refresh();
            }
            outcome
        };

        match outcome {
            ApplyOutcome::Applied => {
                info!(archive = %name, issue_count, "Inspection result applied");
                self.event_bus.emit_lossy(HubEvent::ArchiveInspected {
                    archive: name.to_string(),
                    issue_count,
                    timestamp: Utc::now(),
                });
            }
            ApplyOutcome::Stale => self.announce_discarded(name, generation),
        }

        outcome
    }

    /// Record a failed inspection for `name` if it is still registered as `generation`
    ///
    /// The archive stays uninspected with no issues.
    pub async fn record_inspection_failure(
        &self,
        name: &str,
        generation: Generation,
        message: &str,
    ) -> ApplyOutcome {
        let outcome = {
            let mut state = self.state.write().await;
            if state.registry.is_current(name, generation) {
                state.failures.insert(name.to_string(), message.to_string());
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Stale
            }
        };

        match outcome {
            ApplyOutcome::Applied => {
                warn!(archive = %name, error = %message, "Inspection failed");
                self.event_bus.emit_lossy(HubEvent::InspectionFailed {
                    archive: name.to_string(),
                    message: message.to_string(),
                    timestamp: Utc::now(),
                });
            }
            ApplyOutcome::Stale => self.announce_discarded(name, generation),
        }

        outcome
    }

    /// Remove `name`; returns false if it was not registered
    ///
    /// The selection is left as is, even if it came from this archive.
    pub async fn remove(&self, name: &str) -> bool {
        let removed = {
            let mut state = self.state.write().await;
            let removed = state.registry.remove(name).is_some();
            if removed {
                state.failures.remove(name);
                state.refresh();
            }
            removed
        };

        if removed {
            info!(archive = %name, "Archive removed");
            self.event_bus.emit_lossy(HubEvent::ArchiveRemoved {
                archive: name.to_string(),
                timestamp: Utc::now(),
            });
        }

        removed
    }

    /// Remove every archive and reset the selection
    pub async fn clear(&self) {
        let count = {
            let mut state = self.state.write().await;
            let count = state.registry.len();
            state.registry.clear();
            state.failures.clear();
            state.selection.clear();
            state.refresh();
            count
        };

        info!(archive_count = count, "Workspace cleared");
        self.event_bus.emit_lossy(HubEvent::WorkspaceCleared {
            timestamp: Utc::now(),
        });
    }

    /// Current aggregate issue list
    pub async fn aggregate(&self) -> Arc<Vec<Issue>> {
        Arc::clone(&self.state.read().await.aggregate)
    }

    /// Issues of one archive, or None if it is not registered
    pub async fn issues_of(&self, name: &str) -> Option<Vec<Issue>> {
        let state = self.state.read().await;
        state.registry.get(name).map(|a| a.issues.clone())
    }

    pub async fn archives(&self) -> Vec<ArchiveSummary> {
        let state = self.state.read().await;
        state.registry.iter().map(|a| state.summary(a)).collect()
    }

    pub async fn archive(&self, name: &str) -> Option<ArchiveSummary> {
        let state = self.state.read().await;
        state.registry.get(name).map(|a| state.summary(a))
    }

    pub async fn archive_count(&self) -> usize {
        self.state.read().await.registry.len()
    }

    /// Snapshot of every registered archive's raw bytes, for merging
    pub async fn payloads(&self) -> Vec<ArchivePayload> {
        self.state.read().await.registry.payloads()
    }

    /// Drop the current selection
    pub async fn clear_selection(&self) {
        self.state.write().await.selection.clear();

        self.event_bus.emit_lossy(HubEvent::SelectionChanged {
            archive: None,
            guid: None,
            timestamp: Utc::now(),
        });
    }

    /// Select the aggregate issue identified by `(archive, guid)`
    pub async fn select_issue(&self, archive: &str, guid: &str) -> HubResult<Issue> {
        let issue = {
            let mut state = self.state.write().await;
            let source = state.registry.get(archive).map(|a| a.generation);
            let issue = find_issue(&state.aggregate, archive, guid).cloned();
            match (issue, source) {
                (Some(issue), Some(source)) => {
                    state.selection.select(issue.clone(), source);
                    issue
                }
                _ => {
                    return Err(HubError::NotFound(format!(
                        "issue '{}' in archive '{}'",
                        guid, archive
                    )))
                }
            }
        };

        self.event_bus.emit_lossy(HubEvent::SelectionChanged {
            archive: Some(issue.archive.clone()),
            guid: Some(issue.guid.clone()),
            timestamp: Utc::now(),
        });
        Ok(issue)
    }

    pub async fn selection(&self) -> Option<Issue> {
        self.state
            .read()
            .await
            .selection
            .current()
            .map(|selected| selected.issue.clone())
    }

    /// Current selection, with whether its source registration is still live
    ///
    /// A source that was removed or re-registered since selection reports
    /// `source_registered: false`.
    pub async fn selection_view(&self) -> Option<SelectionView> {
        let state = self.state.read().await;
        state.selection.current().map(|selected| SelectionView {
            issue: selected.issue.clone(),
            source_registered: state
                .registry
                .is_current(&selected.issue.archive, selected.source),
        })
    }

    fn announce_discarded(&self, name: &str, generation: Generation) {
        warn!(
            archive = %name,
            generation = %generation,
            "Discarding inspection result for removed or replaced archive"
        );
        self.event_bus.emit_lossy(HubEvent::InspectionDiscarded {
            archive: name.to_string(),
            timestamp: Utc::now(),
        });
    }
}
