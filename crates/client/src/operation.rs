//! Operation orchestration: create, poll, re-fetch.
//!
//! [`Orchestrator::execute`] submits a creation request, follows the
//! resulting job with a [`Poller`], and re-fetches the finished entity.
//! Every lifecycle step is reported to the caller's event sink as an
//! [`OperationEvent`].

use sparsify_core::error::OperationError;
use sparsify_core::job::RawProgress;
use sparsify_core::kinds::{CreateParams, Entity};
use sparsify_core::progress::normalize;
use sparsify_core::record::OperationEvent;
use tokio_util::sync::CancellationToken;

use crate::poller::{PollConfig, PollOutcome, Poller};
use crate::service::JobService;

/// Receives the events of one operation, in order.
pub type EventSink<'a> = dyn FnMut(OperationEvent<Entity>) + Send + 'a;

/// Runs job-backed operations against one service.
pub struct Orchestrator<'a, S: ?Sized> {
    service: &'a S,
    poll: PollConfig,
}

impl<'a, S> Orchestrator<'a, S>
where
    S: JobService + ?Sized,
{
    pub fn new(service: &'a S, poll: PollConfig) -> Self {
        Self { service, poll }
    }

    /// Create the entity described by `params` and track its job to the end.
    ///
    /// Emits `Created` once the server accepted the request, `Progress`
    /// (labelled `stage`) on every non-terminal poll cycle, and finally
    /// either `Succeeded` with the re-fetched entity or `Failed`.
    ///
    /// A job that settles as `canceled` on the server side still counts as
    /// settled and is re-fetched. Cancelling through `cancel` ends the
    /// operation with [`OperationError::Cancelled`].
    pub async fn execute(
        &self,
        params: &CreateParams,
        stage: &str,
        sink: &mut EventSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<Entity, OperationError> {
        let result = self.run(params, stage, sink, cancel).await;

        match &result {
            Ok(entity) => {
                tracing::info!(
                    kind = %params.kind,
                    entity = %entity.reference,
                    "Operation succeeded",
                );
                sink(OperationEvent::Succeeded(entity.clone()));
            }
            Err(e) => {
                tracing::warn!(kind = %params.kind, error = %e, "Operation failed");
                sink(OperationEvent::Failed(e.to_string()));
            }
        }

        result
    }

    // ---- private helpers ----

    async fn run(
        &self,
        params: &CreateParams,
        stage: &str,
        sink: &mut EventSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<Entity, OperationError> {
        let created = self
            .service
            .create_operation(params)
            .await
            .map_err(OperationError::Create)?;

        let reference = created.entity.reference.clone();
        sink(OperationEvent::Created {
            partial: Some(created.entity),
        });

        let poller = Poller::new(self.service, self.poll.clone());
        let outcome = {
            let mut on_progress = |raw: Option<&RawProgress>| {
                sink(OperationEvent::Progress {
                    stage: stage.to_string(),
                    value: normalize(raw),
                    partial: None,
                });
            };
            poller
                .poll(&created.job.job_id, Some(&mut on_progress), cancel)
                .await?
        };

        match outcome {
            PollOutcome::Settled(job) => {
                tracing::debug!(
                    job_id = %job.job_id,
                    entity = %reference,
                    "Job settled, fetching result",
                );
                self.service
                    .get_entity(&reference)
                    .await
                    .map_err(OperationError::Fetch)
            }
            PollOutcome::CancelRequested(ack) => {
                tracing::info!(
                    job_id = %ack.job_id,
                    status = %ack.status,
                    entity = %reference,
                    "Operation cancelled by caller",
                );
                Err(OperationError::Cancelled)
            }
        }
    }
}
