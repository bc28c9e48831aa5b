#![allow(dead_code)]

use sparsify_core::job::{JobHandle, JobStatus, RawProgress};
use sparsify_core::kinds::{Entity, EntityKind};

pub const PROJECT_ID: &str = "proj-1";

/// A running job reporting `iter_val` on a single step.
pub fn running(job_id: &str, iter_val: f64) -> JobHandle {
    JobHandle::new(job_id, JobStatus::Started)
        .with_progress(RawProgress::steps(None, None, Some(iter_val)))
}

pub fn completed(job_id: &str) -> JobHandle {
    JobHandle::new(job_id, JobStatus::Completed)
}

/// An entity of `kind` whose body references `job_id`.
pub fn entity(kind: EntityKind, id: &str, job_id: &str) -> Entity {
    let mut body = serde_json::json!({ "job_id": job_id });
    body[kind.id_field()] = serde_json::Value::String(id.to_string());
    Entity::from_body(kind, PROJECT_ID, body).expect("body carries the id field")
}
