//! Merge orchestration tests

mod helpers;

use bcfhub_common::events::{EventBus, HubEvent};
use bcfhub_ui::busy::BusySignals;
use bcfhub_ui::client::MergeResponse;
use bcfhub_ui::merge::MergeOrchestrator;
use bcfhub_ui::registry::ArchiveContent;
use bcfhub_ui::workspace::Workspace;
use bcfhub_ui::HubError;
use helpers::{api_error, GatedMerger};
use std::sync::Arc;

async fn workspace_with(names: &[&str]) -> Workspace {
    let workspace = Workspace::new(EventBus::new(64));
    for name in names {
        workspace
            .register(name, ArchiveContent::new(name.as_bytes().to_vec()))
            .await;
    }
    workspace
}

fn merger(busy: &BusySignals, bus: &EventBus) -> (MergeOrchestrator, Arc<GatedMerger>) {
    let service = Arc::new(GatedMerger::new());
    let merger = MergeOrchestrator::new(service.clone(), busy.clone(), bus.clone());
    (merger, service)
}

#[tokio::test]
async fn test_merge_sends_snapshot_in_registration_order() {
    let workspace = workspace_with(&["b.bcf", "a.bcf", "c.bcfzip"]).await;
    let busy = BusySignals::new();
    let bus = EventBus::new(16);
    let (merger, service) = merger(&busy, &bus);

    service
        .gate()
        .send(Ok(MergeResponse {
            bytes: b"PK-merged".to_vec(),
            content_disposition: Some(
                "attachment; filename=\"merged.bcfzip\"; filename*=UTF-8''fusion%20finale.bcfzip"
                    .to_string(),
            ),
        }))
        .unwrap();

    let merged = merger.merge(workspace.payloads().await).await.unwrap();

    assert_eq!(merged.file_name, "fusion finale.bcfzip");
    assert_eq!(merged.bytes, b"PK-merged".to_vec());
    assert_eq!(service.received(), vec![vec!["b.bcf", "a.bcf", "c.bcfzip"]]);
    // Merging never touches the registry
    assert_eq!(workspace.archive_count().await, 3);
}

#[tokio::test]
async fn test_single_archive_is_rejected_without_call() {
    let workspace = workspace_with(&["a.bcf"]).await;
    let busy = BusySignals::new();
    let bus = EventBus::new(16);
    let (merger, service) = merger(&busy, &bus);

    let err = merger.merge(workspace.payloads().await).await.unwrap_err();

    assert!(matches!(err, HubError::Validation(_)));
    assert!(service.received().is_empty());
}

#[tokio::test]
async fn test_merge_busy_while_outstanding() {
    let workspace = workspace_with(&["a.bcf", "b.bcf"]).await;
    let busy = BusySignals::new();
    let bus = EventBus::new(16);
    let (merger, service) = merger(&busy, &bus);
    let gate = service.gate();

    let payloads = workspace.payloads().await;
    let running = {
        let merger = merger.clone();
        tokio::spawn(async move { merger.try_merge(payloads).await })
    };
    while !busy.is_merging() {
        tokio::task::yield_now().await;
    }

    // A second trigger is refused while the first is outstanding
    let err = merger
        .try_merge(workspace.payloads().await)
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::Conflict(_)));

    gate.send(Ok(MergeResponse {
        bytes: vec![1],
        content_disposition: None,
    }))
    .unwrap();
    let merged = running.await.unwrap().unwrap();

    assert!(merged.file_name.starts_with("merged-"));
    assert!(!busy.is_merging());
    assert_eq!(service.received().len(), 1);
}

#[tokio::test]
async fn test_merge_failure_leaves_workspace_unchanged() {
    let workspace = workspace_with(&["a.bcf", "b.bcf"]).await;
    let before = workspace.archives().await;
    let busy = BusySignals::new();
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let (merger, service) = merger(&busy, &bus);

    service
        .gate()
        .send(Err(api_error("Fichiers BCF invalides ou illisibles.")))
        .unwrap();

    let err = merger.merge(workspace.payloads().await).await.unwrap_err();

    assert!(matches!(err, HubError::Merge(ref m) if m.contains("illisibles")));
    assert_eq!(workspace.archives().await, before);
    assert!(!busy.is_merging());
    assert!(matches!(rx.recv().await.unwrap(), HubEvent::MergeFailed { .. }));
}
