#![allow(dead_code)]

use std::sync::Arc;

use sparsify_client::testing::InMemoryJobService;
use sparsify_core::job::{JobHandle, JobStatus, RawProgress};
use sparsify_core::kinds::{CreateParams, Entity, EntityKind, JobKind};
use sparsify_pipeline::PipelineStage;

pub const PROJECT_ID: &str = "proj-1";

pub fn running(job_id: &str, iter_val: f64) -> JobHandle {
    JobHandle::new(job_id, JobStatus::Started)
        .with_progress(RawProgress::steps(None, None, Some(iter_val)))
}

pub fn completed(job_id: &str) -> JobHandle {
    JobHandle::new(job_id, JobStatus::Completed)
}

pub fn failed(job_id: &str, message: &str) -> JobHandle {
    JobHandle::new(job_id, JobStatus::Error).with_error(message)
}

pub fn entity(kind: EntityKind, id: &str, job_id: &str) -> Entity {
    let mut body = serde_json::json!({ "job_id": job_id });
    body[kind.id_field()] = serde_json::Value::String(id.to_string());
    Entity::from_body(kind, PROJECT_ID, body).expect("body carries the id field")
}

pub fn stage(kind: JobKind) -> PipelineStage {
    PipelineStage::new(CreateParams::new(kind, PROJECT_ID))
}

/// A service where the loss profile runs on `j-loss` and the perf profile
/// on `j-perf`. Each job reports 50% once, then completes.
pub fn profiles_service() -> Arc<InMemoryJobService> {
    let service = InMemoryJobService::new();
    service.register_operation(
        JobKind::LossProfile,
        entity(EntityKind::LossProfile, "lp1", "j-loss"),
        "j-loss",
    );
    service.register_operation(
        JobKind::PerfProfile,
        entity(EntityKind::PerfProfile, "pp1", "j-perf"),
        "j-perf",
    );
    service.script_job("j-loss", [running("j-loss", 0.5), completed("j-loss")]);
    service.script_job("j-perf", [running("j-perf", 0.5), completed("j-perf")]);
    Arc::new(service)
}
