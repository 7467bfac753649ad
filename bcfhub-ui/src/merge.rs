//! Merge orchestration
//!
//! Sends a snapshot of registered archives to the merge service once and
//! hands back the consolidated artifact. The registry is never touched.

use bcfhub_common::events::{EventBus, HubEvent};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::busy::{BusyGuard, BusySignals, OperationKind};
use crate::client::MergeService;
use crate::disposition::{default_merge_file_name, parse_filename};
use crate::error::{HubError, HubResult};
use crate::registry::ArchivePayload;
use crate::validation::validate_merge_count;

/// Merge service output ready for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Names of the merged archives, in submission order
    pub source_archives: Vec<String>,
}

#[derive(Clone)]
pub struct MergeOrchestrator {
    service: Arc<dyn MergeService>,
    busy: BusySignals,
    event_bus: EventBus,
}

impl MergeOrchestrator {
    pub fn new(service: Arc<dyn MergeService>, busy: BusySignals, event_bus: EventBus) -> Self {
        Self {
            service,
            busy,
            event_bus,
        }
    }

    /// Merge `archives`, allowing other merges to run alongside
    ///
    /// Fewer than two archives is a validation error and no request is made.
    pub async fn merge(&self, archives: Vec<ArchivePayload>) -> HubResult<ConsolidatedArchive> {
        validate_merge_count(archives.len())?;
        let guard = self.busy.begin(OperationKind::Merge);
        self.run(archives, guard).await
    }

    /// Merge `archives` unless another merge is outstanding
    pub async fn try_merge(&self, archives: Vec<ArchivePayload>) -> HubResult<ConsolidatedArchive> {
        validate_merge_count(archives.len())?;
        let guard = self
            .busy
            .try_begin_exclusive(OperationKind::Merge)
            .ok_or_else(|| HubError::Conflict("a merge is already in progress".to_string()))?;
        self.run(archives, guard).await
    }

    async fn run(
        &self,
        archives: Vec<ArchivePayload>,
        _guard: BusyGuard,
    ) -> HubResult<ConsolidatedArchive> {
        let source_archives: Vec<String> = archives.iter().map(|a| a.name.clone()).collect();
        info!(archives = ?source_archives, "Merge started");

        let response = match self.service.merge(&archives).await {
            Ok(response) => response,
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "Merge failed");
                self.event_bus.emit_lossy(HubEvent::MergeFailed {
                    message: message.clone(),
                    timestamp: Utc::now(),
                });
                return Err(HubError::Merge(message));
            }
        };

        let file_name = response
            .content_disposition
            .as_deref()
            .and_then(parse_filename)
            .unwrap_or_else(|| default_merge_file_name(Utc::now()));

        info!(
            file_name = %file_name,
            size_bytes = response.bytes.len(),
            "Merge completed"
        );
        self.event_bus.emit_lossy(HubEvent::MergeCompleted {
            file_name: file_name.clone(),
            size_bytes: response.bytes.len() as u64,
            archive_count: source_archives.len(),
            timestamp: Utc::now(),
        });

        Ok(ConsolidatedArchive {
            file_name,
            bytes: response.bytes,
            source_archives,
        })
    }
}
