//! In-memory [`JobService`] for tests and offline runs.
//!
//! Job snapshots are scripted per job id: each `get_job` call pops the
//! next scripted response, and the last one repeats forever. Every call is
//! recorded so tests can assert on exactly which requests were made.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use sparsify_core::error::ServiceError;
use sparsify_core::job::{JobHandle, JobStatus};
use sparsify_core::kinds::{CreateParams, Entity, EntityRef, JobKind};
use sparsify_core::types::JobId;

use crate::service::{Created, JobService};

/// A request received by [`InMemoryJobService`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(JobKind),
    GetJob(JobId),
    CancelJob(JobId),
    GetEntity(EntityRef),
    DeleteEntity(EntityRef),
}

#[derive(Default)]
struct State {
    jobs: HashMap<JobId, VecDeque<Result<JobHandle, ServiceError>>>,
    operations: HashMap<JobKind, Result<Created, ServiceError>>,
    entities: HashMap<EntityRef, Entity>,
    cancel_error: Option<ServiceError>,
    delete_error: Option<ServiceError>,
    calls: Vec<Call>,
}

/// Scriptable in-memory job service.
#[derive(Default)]
pub struct InMemoryJobService {
    state: Mutex<State>,
}

impl InMemoryJobService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue snapshots returned by successive `get_job(job_id)` calls.
    pub fn script_job(&self, job_id: &str, snapshots: impl IntoIterator<Item = JobHandle>) {
        let mut state = self.lock();
        let queue = state.jobs.entry(job_id.to_string()).or_default();
        queue.extend(snapshots.into_iter().map(Ok));
    }

    /// Queue a failing `get_job(job_id)` response.
    pub fn script_job_error(&self, job_id: &str, error: ServiceError) {
        let mut state = self.lock();
        state
            .jobs
            .entry(job_id.to_string())
            .or_default()
            .push_back(Err(error));
    }

    /// Make `create_operation` for `kind` return `entity` backed by a
    /// pending job `job_id`. The entity is also stored for `get_entity`.
    pub fn register_operation(&self, kind: JobKind, entity: Entity, job_id: &str) {
        let mut state = self.lock();
        state
            .entities
            .insert(entity.reference.clone(), entity.clone());
        state.operations.insert(
            kind,
            Ok(Created {
                entity,
                job: JobHandle::new(job_id, JobStatus::Pending),
            }),
        );
    }

    /// Make `create_operation` for `kind` fail.
    pub fn fail_operation(&self, kind: JobKind, error: ServiceError) {
        self.lock().operations.insert(kind, Err(error));
    }

    /// Store (or replace) an entity returned by `get_entity`.
    pub fn insert_entity(&self, entity: Entity) {
        self.lock()
            .entities
            .insert(entity.reference.clone(), entity);
    }

    /// Make every `cancel_job` call fail.
    pub fn fail_cancel(&self, error: ServiceError) {
        self.lock().cancel_error = Some(error);
    }

    /// Make every `delete_entity` call fail.
    pub fn fail_delete(&self, error: ServiceError) {
        self.lock().delete_error = Some(error);
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn get_job_calls(&self, job_id: &str) -> usize {
        self.count(|c| matches!(c, Call::GetJob(id) if id == job_id))
    }

    pub fn cancel_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::CancelJob(_)))
    }

    pub fn delete_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::DeleteEntity(_)))
    }

    pub fn contains_entity(&self, entity: &EntityRef) -> bool {
        self.lock().entities.contains_key(entity)
    }

    // ---- private helpers ----

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }
}

fn not_found(what: String) -> ServiceError {
    ServiceError::Server {
        status: 404,
        message: format!("{what} not found"),
    }
}

#[async_trait]
impl JobService for InMemoryJobService {
    async fn create_operation(&self, params: &CreateParams) -> Result<Created, ServiceError> {
        let mut state = self.lock();
        state.calls.push(Call::Create(params.kind));
        state
            .operations
            .get(&params.kind)
            .cloned()
            .unwrap_or_else(|| Err(not_found(format!("operation {}", params.kind))))
    }

    async fn get_job(&self, job_id: &str) -> Result<JobHandle, ServiceError> {
        let mut state = self.lock();
        state.calls.push(Call::GetJob(job_id.to_string()));
        let queue = match state.jobs.get_mut(job_id) {
            Some(queue) => queue,
            None => return Err(not_found(format!("job {job_id}"))),
        };
        if queue.len() > 1 {
            queue
                .pop_front()
                .unwrap_or_else(|| Err(not_found(format!("job {job_id}"))))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(not_found(format!("job {job_id}"))))
        }
    }

    async fn cancel_job(&self, job_id: &str) -> Result<JobHandle, ServiceError> {
        let mut state = self.lock();
        state.calls.push(Call::CancelJob(job_id.to_string()));
        match &state.cancel_error {
            Some(error) => Err(error.clone()),
            None => Ok(JobHandle::new(job_id, JobStatus::Canceling)),
        }
    }

    async fn get_entity(&self, entity: &EntityRef) -> Result<Entity, ServiceError> {
        let mut state = self.lock();
        state.calls.push(Call::GetEntity(entity.clone()));
        state
            .entities
            .get(entity)
            .cloned()
            .ok_or_else(|| not_found(entity.to_string()))
    }

    async fn delete_entity(&self, entity: &EntityRef) -> Result<(), ServiceError> {
        let mut state = self.lock();
        state.calls.push(Call::DeleteEntity(entity.clone()));
        if let Some(error) = &state.delete_error {
            return Err(error.clone());
        }
        state
            .entities
            .remove(entity)
            .map(|_| ())
            .ok_or_else(|| not_found(entity.to_string()))
    }
}
