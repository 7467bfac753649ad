//! Event types for the BCF Hub event system
//!
//! Provides the shared event definitions and the EventBus used to push
//! workspace changes to connected clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Workspace event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HubEvent {
    /// Archive registered (new upload or re-upload under the same name)
    ///
    /// Triggers:
    /// - SSE: Show placeholder row for the archive
    ArchiveRegistered {
        archive: String,
        size_bytes: u64,
        /// True when an existing entry of the same name was replaced
        replaced: bool,
        timestamp: DateTime<Utc>,
    },

    /// Inspection finished and its issues were attached to the archive
    ArchiveInspected {
        archive: String,
        issue_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Inspection failed; the archive stays uninspected
    InspectionFailed {
        archive: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Inspection settled for an archive that was since removed or replaced
    ///
    /// The result was dropped without touching the workspace.
    InspectionDiscarded {
        archive: String,
        timestamp: DateTime<Utc>,
    },

    /// Archive removed from the workspace
    ArchiveRemoved {
        archive: String,
        timestamp: DateTime<Utc>,
    },

    /// All archives removed and selection reset
    WorkspaceCleared { timestamp: DateTime<Utc> },

    /// Focused issue changed (None when cleared)
    SelectionChanged {
        archive: Option<String>,
        guid: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Busy signals changed
    ///
    /// Triggers:
    /// - UI: Disable merge button while anything is outstanding
    BusyChanged {
        inspecting: bool,
        merging: bool,
        timestamp: DateTime<Utc>,
    },

    /// Merge produced a consolidated archive
    MergeCompleted {
        file_name: String,
        size_bytes: u64,
        archive_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Merge failed; workspace unchanged
    MergeFailed {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl HubEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            HubEvent::ArchiveRegistered { .. } => "ArchiveRegistered",
            HubEvent::ArchiveInspected { .. } => "ArchiveInspected",
            HubEvent::InspectionFailed { .. } => "InspectionFailed",
            HubEvent::InspectionDiscarded { .. } => "InspectionDiscarded",
            HubEvent::ArchiveRemoved { .. } => "ArchiveRemoved",
            HubEvent::WorkspaceCleared { .. } => "WorkspaceCleared",
            HubEvent::SelectionChanged { .. } => "SelectionChanged",
            HubEvent::BusyChanged { .. } => "BusyChanged",
            HubEvent::MergeCompleted { .. } => "MergeCompleted",
            HubEvent::MergeFailed { .. } => "MergeFailed",
        }
    }
}

/// Event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use bcfhub_common::events::{EventBus, HubEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(HubEvent::WorkspaceCleared {
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HubEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: HubEvent) -> Result<usize, broadcast::error::SendError<HubEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: HubEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
