//! Fake BCF services for integration tests
//!
//! Each fake call waits on a oneshot "gate" opened by the test, so tests
//! decide exactly when and in which order calls settle.

#![allow(dead_code)]

use async_trait::async_trait;
use bcfhub_common::bcf::{InspectionReport, TopicRecord};
use bcfhub_ui::client::{InspectionService, MergeResponse, MergeService, ServiceError};
use bcfhub_ui::registry::ArchivePayload;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

pub type InspectionGate = oneshot::Sender<Result<InspectionReport, ServiceError>>;
pub type MergeGate = oneshot::Sender<Result<MergeResponse, ServiceError>>;

/// Inspection report with `count` topics whose GUIDs are `{archive}-{i}`
pub fn report(archive: &str, count: usize) -> InspectionReport {
    InspectionReport {
        project: serde_json::json!({ "name": "Test project" }),
        topics: (0..count)
            .map(|i| TopicRecord {
                guid: format!("{}-{}", archive, i),
                title: format!("Clash {} in {}", i, archive),
                status: "Open".to_string(),
                priority: "Normal".to_string(),
                author: "tester@example.com".to_string(),
                created_at: "2024-03-01T10:15:00Z".to_string(),
                ..Default::default()
            })
            .collect(),
    }
}

pub fn api_error(message: &str) -> ServiceError {
    ServiceError::Api {
        status: 400,
        message: message.to_string(),
    }
}

/// Inspection service whose calls settle when the test opens their gate
///
/// Gates are queued per archive name; each call for that name takes the
/// oldest one. A call with no queued gate fails immediately.
#[derive(Default)]
pub struct GatedInspector {
    gates: Mutex<HashMap<String, VecDeque<oneshot::Receiver<Result<InspectionReport, ServiceError>>>>>,
    calls: AtomicUsize,
}

impl GatedInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a gate for the next inspection of `name`
    pub fn gate(&self, name: &str) -> InspectionGate {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Yield until at least `n` calls have taken their gate
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl InspectionService for GatedInspector {
    async fn inspect(&self, archive: &ArchivePayload) -> Result<InspectionReport, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .gates
            .lock()
            .unwrap()
            .get_mut(&archive.name)
            .and_then(VecDeque::pop_front);

        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ServiceError::Network("gate dropped".to_string()))),
            None => Err(ServiceError::Network(format!("no gate for {}", archive.name))),
        }
    }
}

/// Merge service whose calls settle when the test opens their gate
#[derive(Default)]
pub struct GatedMerger {
    gates: Mutex<VecDeque<oneshot::Receiver<Result<MergeResponse, ServiceError>>>>,
    received: Mutex<Vec<Vec<String>>>,
}

impl GatedMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate(&self) -> MergeGate {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    /// Archive names sent with each merge call, in call order
    pub fn received(&self) -> Vec<Vec<String>> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl MergeService for GatedMerger {
    async fn merge(&self, archives: &[ArchivePayload]) -> Result<MergeResponse, ServiceError> {
        self.received
            .lock()
            .unwrap()
            .push(archives.iter().map(|a| a.name.clone()).collect());
        let gate = self.gates.lock().unwrap().pop_front();

        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ServiceError::Network("gate dropped".to_string()))),
            None => Err(ServiceError::Network("no merge gate".to_string())),
        }
    }
}
