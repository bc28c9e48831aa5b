//! Integration tests for the operation orchestrator.

mod common;

use assert_matches::assert_matches;
use sparsify_client::operation::Orchestrator;
use sparsify_client::poller::PollConfig;
use sparsify_client::testing::{Call, InMemoryJobService};
use sparsify_core::error::{JobError, OperationError, ServiceError};
use sparsify_core::job::{JobHandle, JobStatus, RawProgress};
use sparsify_core::kinds::{CreateParams, Entity, EntityKind, JobKind};
use sparsify_core::record::OperationEvent;
use tokio_util::sync::CancellationToken;

use common::{completed, entity, running, PROJECT_ID};

const STAGE: &str = "Profiling Performance";

fn perf_params() -> CreateParams {
    CreateParams::new(JobKind::PerfProfile, PROJECT_ID)
        .with_body(serde_json::json!({"batch_size": 1, "core_count": 4}))
}

async fn run(
    service: &InMemoryJobService,
    cancel: &CancellationToken,
) -> (Result<Entity, OperationError>, Vec<OperationEvent<Entity>>) {
    let mut events = Vec::new();
    let mut sink = |event: OperationEvent<Entity>| events.push(event);
    let result = Orchestrator::new(service, PollConfig::default())
        .execute(&perf_params(), STAGE, &mut sink, cancel)
        .await;
    (result, events)
}

#[tokio::test(start_paused = true)]
async fn success_emits_created_progress_and_refetched_entity() {
    let service = InMemoryJobService::new();
    let created = entity(EntityKind::PerfProfile, "pp1", "j1");
    service.register_operation(JobKind::PerfProfile, created.clone(), "j1");
    service.script_job(
        "j1",
        [
            JobHandle::new("j1", JobStatus::Started)
                .with_progress(RawProgress::steps(Some(4), Some(1), Some(0.5))),
            completed("j1"),
        ],
    );

    // The server fills in results once the job completes.
    let mut finished = created.clone();
    finished.body["results"] = serde_json::json!({"baseline": {"ms": 12.5}});
    service.insert_entity(finished.clone());

    let (result, events) = run(&service, &CancellationToken::new()).await;

    assert_eq!(result.unwrap(), finished);
    assert_eq!(
        events,
        vec![
            OperationEvent::Created {
                partial: Some(created.clone()),
            },
            OperationEvent::Progress {
                stage: STAGE.into(),
                value: Some(37.5),
                partial: None,
            },
            OperationEvent::Succeeded(finished.clone()),
        ]
    );
    assert_eq!(
        service.calls().last(),
        Some(&Call::GetEntity(created.reference.clone()))
    );
}

#[tokio::test(start_paused = true)]
async fn indefinite_progress_is_emitted_as_unknown() {
    let service = InMemoryJobService::new();
    let created = entity(EntityKind::PerfProfile, "pp1", "j1");
    service.register_operation(JobKind::PerfProfile, created, "j1");
    service.script_job(
        "j1",
        [
            JobHandle::new("j1", JobStatus::Started).with_progress(RawProgress::indefinite()),
            completed("j1"),
        ],
    );

    let (result, events) = run(&service, &CancellationToken::new()).await;

    assert!(result.is_ok());
    assert_matches!(&events[1], OperationEvent::Progress { value: None, .. });
}

#[tokio::test(start_paused = true)]
async fn job_error_fails_with_job_message() {
    let service = InMemoryJobService::new();
    service.register_operation(
        JobKind::PerfProfile,
        entity(EntityKind::PerfProfile, "pp1", "j1"),
        "j1",
    );
    service.script_job(
        "j1",
        [
            running("j1", 0.4),
            JobHandle::new("j1", JobStatus::Error).with_error("engine crashed"),
        ],
    );

    let (result, events) = run(&service, &CancellationToken::new()).await;

    assert_matches!(result, Err(OperationError::Job(JobError::Failed { .. })));
    assert_eq!(
        events.last(),
        Some(&OperationEvent::Failed("engine crashed".into()))
    );
    // The entity is never re-fetched after a failed job.
    assert!(!service
        .calls()
        .iter()
        .any(|c| matches!(c, Call::GetEntity(_))));
}

#[tokio::test(start_paused = true)]
async fn create_failure_emits_failed_without_created() {
    let service = InMemoryJobService::new();
    service.fail_operation(
        JobKind::PerfProfile,
        ServiceError::Server {
            status: 400,
            message: "model not analyzed".into(),
        },
    );

    let (result, events) = run(&service, &CancellationToken::new()).await;

    assert_matches!(result, Err(OperationError::Create(ServiceError::Server { status: 400, .. })));
    assert_eq!(events.len(), 1);
    assert_matches!(&events[0], OperationEvent::Failed(msg) if msg.contains("model not analyzed"));
}

#[tokio::test(start_paused = true)]
async fn refetch_failure_is_reported() {
    let service = InMemoryJobService::new();
    let created = entity(EntityKind::PerfProfile, "pp1", "j1");
    service.register_operation(JobKind::PerfProfile, created.clone(), "j1");
    service.script_job("j1", [completed("j1")]);
    // Someone deleted the profile while its job was finishing.
    assert!(service.contains_entity(&created.reference));
    sparsify_client::JobService::delete_entity(&service, &created.reference)
        .await
        .unwrap();

    let (result, events) = run(&service, &CancellationToken::new()).await;

    assert_matches!(result, Err(OperationError::Fetch(_)));
    assert_matches!(events.last(), Some(OperationEvent::Failed(_)));
}

#[tokio::test(start_paused = true)]
async fn caller_cancellation_ends_with_cancelled() {
    let service = InMemoryJobService::new();
    service.register_operation(
        JobKind::PerfProfile,
        entity(EntityKind::PerfProfile, "pp1", "j1"),
        "j1",
    );
    service.script_job("j1", [running("j1", 0.1)]);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let (result, events) = run(&service, &cancel).await;

    assert_matches!(result, Err(OperationError::Cancelled));
    assert_eq!(service.cancel_calls(), 1);
    assert_eq!(
        events.last(),
        Some(&OperationEvent::Failed("Operation cancelled".into()))
    );
}
