//! Integration tests for cancel-and-discard.

mod common;

use assert_matches::assert_matches;
use sparsify_client::discard::cancel_and_discard;
use sparsify_client::testing::{Call, InMemoryJobService};
use sparsify_core::error::ServiceError;
use sparsify_core::job::{JobHandle, JobStatus};
use sparsify_core::kinds::{Entity, EntityKind};

use common::{completed, entity, running, PROJECT_ID};

#[tokio::test]
async fn completed_job_is_not_cancelled() {
    let service = InMemoryJobService::new();
    let profile = entity(EntityKind::LossProfile, "lp1", "j1");
    service.insert_entity(profile.clone());
    service.script_job("j1", [completed("j1")]);

    cancel_and_discard(&service, &profile.reference).await.unwrap();

    assert_eq!(service.cancel_calls(), 0);
    assert_eq!(service.delete_calls(), 1);
    assert!(!service.contains_entity(&profile.reference));
}

#[tokio::test]
async fn running_job_is_cancelled_before_delete() {
    let service = InMemoryJobService::new();
    let profile = entity(EntityKind::LossProfile, "lp1", "j1");
    service.insert_entity(profile.clone());
    service.script_job("j1", [running("j1", 0.3)]);

    cancel_and_discard(&service, &profile.reference).await.unwrap();

    assert_eq!(
        service.calls(),
        vec![
            Call::GetEntity(profile.reference.clone()),
            Call::GetJob("j1".into()),
            Call::CancelJob("j1".into()),
            Call::DeleteEntity(profile.reference.clone()),
        ]
    );
}

#[tokio::test]
async fn embedded_job_status_avoids_a_job_fetch() {
    let service = InMemoryJobService::new();
    let body = serde_json::json!({
        "benchmark_id": "b1",
        "job": {"job_id": "j9", "status": "error", "error": "oom"}
    });
    let benchmark = Entity::from_body(EntityKind::Benchmark, PROJECT_ID, body).unwrap();
    service.insert_entity(benchmark.clone());

    cancel_and_discard(&service, &benchmark.reference).await.unwrap();

    assert_eq!(service.get_job_calls("j9"), 0);
    assert_eq!(service.cancel_calls(), 0);
    assert_eq!(service.delete_calls(), 1);
}

#[tokio::test]
async fn cancel_failure_is_swallowed() {
    let service = InMemoryJobService::new();
    let profile = entity(EntityKind::PerfProfile, "pp1", "j1");
    service.insert_entity(profile.clone());
    service.script_job("j1", [JobHandle::new("j1", JobStatus::Pending)]);
    service.fail_cancel(ServiceError::Server {
        status: 400,
        message: "job already completed".into(),
    });

    cancel_and_discard(&service, &profile.reference).await.unwrap();

    assert_eq!(service.cancel_calls(), 1);
    assert_eq!(service.delete_calls(), 1);
}

#[tokio::test]
async fn unreadable_job_status_still_attempts_cancel() {
    let service = InMemoryJobService::new();
    let profile = entity(EntityKind::PerfProfile, "pp1", "j-missing");
    service.insert_entity(profile.clone());

    cancel_and_discard(&service, &profile.reference).await.unwrap();

    assert_eq!(service.cancel_calls(), 1);
    assert_eq!(service.delete_calls(), 1);
}

#[tokio::test]
async fn delete_failure_propagates() {
    let service = InMemoryJobService::new();
    let profile = entity(EntityKind::PerfProfile, "pp1", "j1");
    service.insert_entity(profile.clone());
    service.script_job("j1", [running("j1", 0.3)]);
    service.fail_cancel(ServiceError::Transport("connection refused".into()));
    service.fail_delete(ServiceError::Server {
        status: 500,
        message: "delete failed".into(),
    });

    let err = cancel_and_discard(&service, &profile.reference)
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::Server { status: 500, .. });
    assert_eq!(service.cancel_calls(), 1);
}

#[tokio::test]
async fn missing_entity_propagates_and_skips_delete() {
    let service = InMemoryJobService::new();
    let profile = entity(EntityKind::PerfProfile, "pp1", "j1");

    let err = cancel_and_discard(&service, &profile.reference)
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::Server { status: 404, .. });
    assert_eq!(service.delete_calls(), 0);
}
