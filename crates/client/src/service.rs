//! The job service contract.
//!
//! Everything above this trait (poller, orchestrator, pipelines) is
//! transport-agnostic. [`crate::api::SparsifyApi`] implements it over
//! HTTP; `InMemoryJobService` (behind the `testing` feature) implements it
//! in memory.

use std::sync::Arc;

use async_trait::async_trait;
use sparsify_core::error::ServiceError;
use sparsify_core::job::JobHandle;
use sparsify_core::kinds::{CreateParams, Entity, EntityRef};

/// Result of a successful creation request: the new entity and the job
/// that will populate it.
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub entity: Entity,
    pub job: JobHandle,
}

/// Request/response calls the orchestration core needs from the server.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Create a job-backed entity and start its job.
    async fn create_operation(&self, params: &CreateParams) -> Result<Created, ServiceError>;

    /// Fetch the current snapshot of a job.
    async fn get_job(&self, job_id: &str) -> Result<JobHandle, ServiceError>;

    /// Ask the server to cancel a job. Returns the server's acknowledgement.
    async fn cancel_job(&self, job_id: &str) -> Result<JobHandle, ServiceError>;

    /// Fetch an entity by reference.
    async fn get_entity(&self, entity: &EntityRef) -> Result<Entity, ServiceError>;

    /// Delete an entity.
    async fn delete_entity(&self, entity: &EntityRef) -> Result<(), ServiceError>;
}

#[async_trait]
impl<S: JobService + ?Sized> JobService for Arc<S> {
    async fn create_operation(&self, params: &CreateParams) -> Result<Created, ServiceError> {
        (**self).create_operation(params).await
    }

    async fn get_job(&self, job_id: &str) -> Result<JobHandle, ServiceError> {
        (**self).get_job(job_id).await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<JobHandle, ServiceError> {
        (**self).cancel_job(job_id).await
    }

    async fn get_entity(&self, entity: &EntityRef) -> Result<Entity, ServiceError> {
        (**self).get_entity(entity).await
    }

    async fn delete_entity(&self, entity: &EntityRef) -> Result<(), ServiceError> {
        (**self).delete_entity(entity).await
    }
}
