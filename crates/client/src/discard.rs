//! Cancel-and-discard: abandon a job-backed entity.
//!
//! Used when the caller no longer wants an entity whose job may still be
//! running. The cancel step is best effort; only the delete step can fail
//! the call.

use sparsify_core::error::ServiceError;
use sparsify_core::kinds::EntityRef;

use crate::service::JobService;

/// Cancel the entity's job if it is still running, then delete the entity.
///
/// * The entity is fetched first; a fetch failure is returned.
/// * The job status is read from the job embedded in the entity, or
///   fetched by `job_id` otherwise.
/// * A non-terminal (or unreadable) job gets one cancel request. Any
///   failure of that request is logged and swallowed: the job may already
///   have finished between the read and the cancel.
/// * The delete request is always sent and its failure is returned.
pub async fn cancel_and_discard<S>(service: &S, entity: &EntityRef) -> Result<(), ServiceError>
where
    S: JobService + ?Sized,
{
    let current = service.get_entity(entity).await?;

    if let Some(job_id) = current.job_id() {
        let status = match current.embedded_job() {
            Some(job) => Some(job.status),
            None => match service.get_job(&job_id).await {
                Ok(job) => Some(job.status),
                Err(e) => {
                    tracing::warn!(job_id = %job_id, error = %e, "Failed to read job status");
                    None
                }
            },
        };

        match status {
            Some(status) if status.is_terminal() => {
                tracing::debug!(job_id = %job_id, %status, "Job already finished, skipping cancel");
            }
            _ => {
                if let Err(e) = service.cancel_job(&job_id).await {
                    tracing::warn!(job_id = %job_id, error = %e, "Best-effort job cancel failed");
                }
            }
        }
    }

    service.delete_entity(entity).await?;
    tracing::info!(entity = %entity, "Entity discarded");
    Ok(())
}
