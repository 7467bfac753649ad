//! Busy signals for inspection and merge
//!
//! Each operation class is backed by an outstanding-operation counter; a
//! class is busy while its counter is above zero. Callers hold a
//! [`BusyGuard`] for the lifetime of the operation, so the counter is
//! released even when the task errors or panics.

use bcfhub_common::events::{EventBus, HubEvent};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Operation classes tracked by [`BusySignals`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Inspection,
    Merge,
}

/// Point-in-time view of the busy counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusyStatus {
    pub inspecting: bool,
    pub merging: bool,
    pub inspections_outstanding: usize,
    pub merges_outstanding: usize,
}

struct Counters {
    inspections: AtomicUsize,
    merges: AtomicUsize,
    /// Held across a counter change and its announcement, so announced
    /// states arrive in the order the transitions happened
    transition: Mutex<()>,
    event_bus: Option<EventBus>,
}

impl Counters {
    fn lock_transition(&self) -> MutexGuard<'_, ()> {
        self.transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn counter(&self, kind: OperationKind) -> &AtomicUsize {
        match kind {
            OperationKind::Inspection => &self.inspections,
            OperationKind::Merge => &self.merges,
        }
    }

    fn status(&self) -> BusyStatus {
        let inspections = self.inspections.load(Ordering::SeqCst);
        let merges = self.merges.load(Ordering::SeqCst);
        BusyStatus {
            inspecting: inspections > 0,
            merging: merges > 0,
            inspections_outstanding: inspections,
            merges_outstanding: merges,
        }
    }

    fn announce(&self) {
        if let Some(bus) = &self.event_bus {
            let status = self.status();
            bus.emit_lossy(HubEvent::BusyChanged {
                inspecting: status.inspecting,
                merging: status.merging,
                timestamp: chrono::Utc::now(),
            });
        }
    }
}

/// Shared, cloneable busy counters
#[derive(Clone)]
pub struct BusySignals {
    counters: Arc<Counters>,
}

impl BusySignals {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Counters that publish `BusyChanged` whenever a class flips state
    pub fn with_event_bus(event_bus: EventBus) -> Self {
        Self::build(Some(event_bus))
    }

    fn build(event_bus: Option<EventBus>) -> Self {
        Self {
            counters: Arc::new(Counters {
                inspections: AtomicUsize::new(0),
                merges: AtomicUsize::new(0),
                transition: Mutex::new(()),
                event_bus,
            }),
        }
    }

    /// Count one outstanding operation until the returned guard drops
    pub fn begin(&self, kind: OperationKind) -> BusyGuard {
        let _transition = self.counters.lock_transition();
        let previous = self.counters.counter(kind).fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            self.counters.announce();
        }
        BusyGuard {
            counters: Arc::clone(&self.counters),
            kind,
        }
    }

    /// Like [`BusySignals::begin`], but only when nothing of `kind` is outstanding
    pub fn try_begin_exclusive(&self, kind: OperationKind) -> Option<BusyGuard> {
        let _transition = self.counters.lock_transition();
        self.counters
            .counter(kind)
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        self.counters.announce();
        Some(BusyGuard {
            counters: Arc::clone(&self.counters),
            kind,
        })
    }

    pub fn is_inspecting(&self) -> bool {
        self.counters.inspections.load(Ordering::SeqCst) > 0
    }

    pub fn is_merging(&self) -> bool {
        self.counters.merges.load(Ordering::SeqCst) > 0
    }

    pub fn outstanding(&self, kind: OperationKind) -> usize {
        self.counters.counter(kind).load(Ordering::SeqCst)
    }

    pub fn status(&self) -> BusyStatus {
        self.counters.status()
    }
}

impl Default for BusySignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases one outstanding operation on drop
pub struct BusyGuard {
    counters: Arc<Counters>,
    kind: OperationKind,
}

impl BusyGuard {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let _transition = self.counters.lock_transition();
        let previous = self.counters.counter(self.kind).fetch_sub(1, Ordering::SeqCst);
        if previous == 1 {
            self.counters.announce();
        }
    }
}
