//! Concurrent inspection tests
//!
//! Inspections are driven through gated fake services so each test fixes
//! the order in which they settle.

mod helpers;

use bcfhub_common::events::EventBus;
use bcfhub_common::Issue;
use bcfhub_ui::busy::BusySignals;
use bcfhub_ui::coordinator::{InspectionCoordinator, InspectionOutcome};
use bcfhub_ui::registry::ArchiveContent;
use bcfhub_ui::workspace::{InspectionStatus, Workspace};
use bcfhub_ui::HubError;
use helpers::{api_error, report, GatedInspector};
use std::sync::Arc;

struct Harness {
    workspace: Workspace,
    coordinator: InspectionCoordinator,
    busy: BusySignals,
    inspector: Arc<GatedInspector>,
}

fn harness() -> Harness {
    let event_bus = EventBus::new(256);
    let workspace = Workspace::new(event_bus.clone());
    let busy = BusySignals::with_event_bus(event_bus);
    let inspector = Arc::new(GatedInspector::new());
    let coordinator = InspectionCoordinator::new(workspace.clone(), inspector.clone(), busy.clone());

    Harness {
        workspace,
        coordinator,
        busy,
        inspector,
    }
}

fn content(tag: u8) -> ArchiveContent {
    ArchiveContent::new(vec![0x50, 0x4b, 0x03, 0x04, tag])
}

fn guids(issues: &[Issue]) -> Vec<String> {
    issues.iter().map(|i| i.guid.clone()).collect()
}

/// Register a.bcf then b.bcf, settle in the given order, return the aggregate
async fn settle_in_order(a_first: bool) -> Vec<Issue> {
    let h = harness();
    let gate_a = h.inspector.gate("a.bcf");
    let gate_b = h.inspector.gate("b.bcf");

    let ticket_a = h.coordinator.submit("a.bcf", content(1)).await;
    let ticket_b = h.coordinator.submit("b.bcf", content(2)).await;

    if a_first {
        gate_a.send(Ok(report("a.bcf", 2))).unwrap();
        ticket_a.outcome().await.unwrap();
        gate_b.send(Ok(report("b.bcf", 3))).unwrap();
        ticket_b.outcome().await.unwrap();
    } else {
        gate_b.send(Ok(report("b.bcf", 3))).unwrap();
        ticket_b.outcome().await.unwrap();
        gate_a.send(Ok(report("a.bcf", 2))).unwrap();
        ticket_a.outcome().await.unwrap();
    }

    h.workspace.aggregate().await.to_vec()
}

#[tokio::test]
async fn test_completion_order_does_not_change_aggregate() {
    let a_then_b = settle_in_order(true).await;
    let b_then_a = settle_in_order(false).await;

    assert_eq!(a_then_b, b_then_a);
    assert_eq!(
        guids(&a_then_b),
        vec!["a.bcf-0", "a.bcf-1", "b.bcf-0", "b.bcf-1", "b.bcf-2"]
    );
    assert!(a_then_b[..2].iter().all(|i| i.archive == "a.bcf"));
}

#[tokio::test]
async fn test_busy_stays_raised_until_last_inspection_settles() {
    let h = harness();
    let gate_a = h.inspector.gate("a.bcf");
    let gate_b = h.inspector.gate("b.bcf");

    let ticket_a = h.coordinator.submit("a.bcf", content(1)).await;
    let ticket_b = h.coordinator.submit("b.bcf", content(2)).await;
    assert!(h.busy.is_inspecting());
    assert_eq!(h.busy.status().inspections_outstanding, 2);

    gate_a.send(Ok(report("a.bcf", 1))).unwrap();
    ticket_a.outcome().await.unwrap();
    assert!(h.busy.is_inspecting(), "b.bcf is still outstanding");

    gate_b.send(Ok(report("b.bcf", 1))).unwrap();
    ticket_b.outcome().await.unwrap();
    assert!(!h.busy.is_inspecting());
}

#[tokio::test]
async fn test_busy_released_when_inspection_fails() {
    let h = harness();
    let gate = h.inspector.gate("a.bcf");

    let ticket = h.coordinator.submit("a.bcf", content(1)).await;
    gate.send(Err(api_error("Fichier BCF invalide"))).unwrap();

    assert!(matches!(ticket.outcome().await, Err(HubError::Inspection { .. })));
    assert!(!h.busy.is_inspecting());
}

#[tokio::test]
async fn test_reregistered_archive_discards_stale_result() {
    let h = harness();
    let old_gate = h.inspector.gate("a.bcf");
    let new_gate = h.inspector.gate("a.bcf");

    let old = h.coordinator.submit("a.bcf", content(1)).await;
    h.inspector.wait_for_calls(1).await;
    let new = h.coordinator.submit("a.bcf", content(2)).await;
    assert!(new.replaced);
    assert_ne!(old.generation, new.generation);

    // The replacement settles first, then the stale inspection arrives late
    new_gate.send(Ok(report("a.bcf", 1))).unwrap();
    new.outcome().await.unwrap();
    old_gate.send(Ok(report("stale", 4))).unwrap();

    assert_eq!(
        old.outcome().await.unwrap(),
        InspectionOutcome::Discarded {
            archive: "a.bcf".to_string()
        }
    );

    let issues = h.workspace.aggregate().await;
    assert_eq!(guids(&issues), vec!["a.bcf-0"]);
    assert!(!h.busy.is_inspecting());
}

#[tokio::test]
async fn test_reregistration_resets_inspected_archive() {
    let h = harness();
    let first = h.inspector.gate("a.bcf");
    let _second = h.inspector.gate("a.bcf");

    let ticket = h.coordinator.submit("a.bcf", content(1)).await;
    first.send(Ok(report("a.bcf", 3))).unwrap();
    ticket.outcome().await.unwrap();
    assert_eq!(h.workspace.aggregate().await.len(), 3);

    h.coordinator.submit("a.bcf", content(2)).await;

    let summary = h.workspace.archive("a.bcf").await.unwrap();
    assert!(!summary.inspected);
    assert_eq!(summary.inspection, InspectionStatus::Pending);
    assert!(h.workspace.aggregate().await.is_empty());
}

#[tokio::test]
async fn test_removed_archive_ignores_late_result() {
    let h = harness();
    let gate_a = h.inspector.gate("a.bcf");
    let gate_b = h.inspector.gate("b.bcf");

    let ticket_a = h.coordinator.submit("a.bcf", content(1)).await;
    let ticket_b = h.coordinator.submit("b.bcf", content(2)).await;

    gate_b.send(Ok(report("b.bcf", 2))).unwrap();
    ticket_b.outcome().await.unwrap();

    assert!(h.workspace.remove("a.bcf").await);
    gate_a.send(Ok(report("a.bcf", 5))).unwrap();
    assert!(matches!(
        ticket_a.outcome().await.unwrap(),
        InspectionOutcome::Discarded { .. }
    ));

    assert!(h.workspace.archive("a.bcf").await.is_none());
    assert_eq!(guids(&h.workspace.aggregate().await), vec!["b.bcf-0", "b.bcf-1"]);
}

#[tokio::test]
async fn test_removed_archive_ignores_late_failure() {
    let h = harness();
    let gate = h.inspector.gate("a.bcf");

    let ticket = h.coordinator.submit("a.bcf", content(1)).await;
    h.workspace.clear().await;
    gate.send(Err(api_error("too late"))).unwrap();

    assert!(matches!(
        ticket.outcome().await.unwrap(),
        InspectionOutcome::Discarded { .. }
    ));
    assert_eq!(h.workspace.archive_count().await, 0);
}

#[tokio::test]
async fn test_failure_leaves_other_archives_untouched() {
    let h = harness();
    let gate_a = h.inspector.gate("a.bcf");
    let gate_b = h.inspector.gate("b.bcf");

    let ticket_a = h.coordinator.submit("a.bcf", content(1)).await;
    let ticket_b = h.coordinator.submit("b.bcf", content(2)).await;

    gate_a.send(Ok(report("a.bcf", 2))).unwrap();
    ticket_a.outcome().await.unwrap();
    gate_b.send(Err(api_error("Fichier BCF invalide"))).unwrap();

    match ticket_b.outcome().await {
        Err(HubError::Inspection { archive, message }) => {
            assert_eq!(archive, "b.bcf");
            assert!(message.contains("Fichier BCF invalide"));
        }
        other => panic!("expected inspection failure, got {:?}", other),
    }

    let archives = h.workspace.archives().await;
    assert!(archives[0].inspected);
    assert!(!archives[1].inspected);
    assert!(matches!(archives[1].inspection, InspectionStatus::Failed { .. }));
    assert_eq!(guids(&h.workspace.aggregate().await), vec!["a.bcf-0", "a.bcf-1"]);
}

#[tokio::test]
async fn test_each_submission_inspected_exactly_once() {
    let h = harness();
    let gates: Vec<_> = ["a.bcf", "b.bcf", "c.bcf"]
        .iter()
        .map(|name| h.inspector.gate(name))
        .collect();

    let mut tickets = Vec::new();
    for name in ["a.bcf", "b.bcf", "c.bcf"] {
        tickets.push(h.coordinator.submit(name, content(0)).await);
    }

    // Settle in reverse order
    for (gate, name) in gates.into_iter().zip(["a.bcf", "b.bcf", "c.bcf"]).rev() {
        gate.send(Ok(report(name, 1))).unwrap();
    }
    for ticket in tickets {
        ticket.outcome().await.unwrap();
    }

    assert_eq!(h.inspector.calls(), 3);
    assert_eq!(
        guids(&h.workspace.aggregate().await),
        vec!["a.bcf-0", "b.bcf-0", "c.bcf-0"]
    );
}

#[tokio::test]
async fn test_aggregate_matches_registry_after_mixed_operations() {
    let h = harness();
    let names = ["a.bcf", "b.bcf", "c.bcf", "d.bcf"];

    for (count, name) in names.iter().enumerate() {
        let gate = h.inspector.gate(name);
        gate.send(Ok(report(name, count + 1))).unwrap();
        h.coordinator
            .submit(name, content(0))
            .await
            .outcome()
            .await
            .unwrap();
    }

    h.workspace.remove("b.bcf").await;
    let gate = h.inspector.gate("c.bcf");
    gate.send(Ok(report("c.bcf", 1))).unwrap();
    h.coordinator
        .submit("c.bcf", content(9))
        .await
        .outcome()
        .await
        .unwrap();

    let mut expected = Vec::new();
    for summary in h.workspace.archives().await {
        expected.extend(h.workspace.issues_of(&summary.name).await.unwrap());
    }
    let aggregate = h.workspace.aggregate().await;
    assert_eq!(aggregate.as_slice(), expected.as_slice());
    assert_eq!(
        guids(&aggregate),
        vec!["a.bcf-0", "c.bcf-0", "d.bcf-0", "d.bcf-1", "d.bcf-2", "d.bcf-3"]
    );
}
