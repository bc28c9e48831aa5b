//! Run-and-abandon surface over one pipeline.
//!
//! [`PipelineController`] owns the published record of a pipeline and at
//! most one running pipeline task. Starting a new run cancels the previous
//! one; [`PipelineController::cancel_and_discard`] stops the current run
//! and removes every entity it created.

use std::sync::Arc;

use sparsify_core::error::ServiceError;
use sparsify_core::record::{OperationEvent, OperationRecord};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::composer::{Pipeline, PipelineError};
use crate::publisher::RecordPublisher;
use crate::stage::{PipelineStage, StageOutput};

type PipelineRecord = OperationRecord<Vec<StageOutput>>;
type RunOutcome = Result<Vec<StageOutput>, PipelineError>;

/// Drives a [`Pipeline`] and publishes its record.
pub struct PipelineController {
    pipeline: Arc<Pipeline>,
    publisher: Arc<RecordPublisher<Vec<StageOutput>>>,
    /// Latest run. Locked only to swap runs, never while a run is awaited.
    run: Mutex<Option<RunningPipeline>>,
}

/// Handle on the spawned pipeline task.
#[derive(Clone)]
struct RunningPipeline {
    cancel: CancellationToken,
    /// Set to `Some` once the task has produced its outcome.
    outcome: watch::Receiver<Option<RunOutcome>>,
}

impl PipelineController {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            publisher: Arc::new(RecordPublisher::new()),
            run: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineRecord> {
        self.publisher.subscribe()
    }

    pub fn current(&self) -> PipelineRecord {
        self.publisher.current()
    }

    /// Reset the record and run `stages` on a new task.
    ///
    /// A run that is still in flight is cancelled and awaited first.
    pub async fn start(&self, stages: Vec<PipelineStage>) {
        let mut run = self.run.lock().await;

        if let Some(previous) = run.take() {
            tracing::info!("Cancelling previous pipeline run");
            previous.stop().await;
        }

        self.publisher.reset();

        let cancel = CancellationToken::new();
        let (done, outcome) = watch::channel(None);
        let pipeline = Arc::clone(&self.pipeline);
        let publisher = Arc::clone(&self.publisher);
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut sink = |event: OperationEvent<Vec<StageOutput>>| publisher.apply(event);
            let result = pipeline.run(&stages, &mut sink, &token).await;
            done.send_replace(Some(result));
        });

        *run = Some(RunningPipeline { cancel, outcome });
    }

    /// Wait for the latest run to finish and return its result.
    ///
    /// Any number of callers may wait at once; none of them blocks
    /// [`start`](Self::start) or [`cancel_and_discard`](Self::cancel_and_discard).
    pub async fn wait(&self) -> RunOutcome {
        let running = self.run.lock().await.clone();
        match running {
            Some(running) => running.finished().await,
            None => Err(PipelineError::NotStarted),
        }
    }

    /// Stop the current run and discard every entity it created.
    ///
    /// Each created entity goes through
    /// [`sparsify_client::cancel_and_discard`]. All entities are attempted
    /// and the first error is returned. The record is reset to idle only
    /// when every discard succeeded.
    pub async fn cancel_and_discard(&self) -> Result<(), ServiceError> {
        let running = self.run.lock().await.take();
        if let Some(running) = running {
            running.stop().await;
        }

        let outputs = self.publisher.current().value.unwrap_or_default();
        let mut first_error = None;

        for output in &outputs {
            let reference = &output.entity.reference;
            match sparsify_client::cancel_and_discard(self.pipeline.service(), reference).await {
                Ok(()) => {
                    tracing::info!(stage = %output.stage, entity = %reference, "Entity discarded");
                }
                Err(e) => {
                    tracing::error!(
                        stage = %output.stage,
                        entity = %reference,
                        error = %e,
                        "Failed to discard entity",
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                self.publisher.reset();
                Ok(())
            }
        }
    }
}

impl RunningPipeline {
    /// Resolve once the task has finished.
    async fn finished(mut self) -> RunOutcome {
        let outcome = match self.outcome.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| {
            Err(PipelineError::Interrupted(
                "pipeline task stopped without a result".to_string(),
            ))
        })
    }

    /// Cancel the task's token and wait for it to wind down.
    async fn stop(self) {
        self.cancel.cancel();
        match self.finished().await {
            Ok(_) => tracing::debug!("Pipeline finished before cancellation"),
            Err(PipelineError::Interrupted(e)) => {
                tracing::warn!(error = %e, "Pipeline task ended unexpectedly");
            }
            Err(e) => tracing::debug!(error = %e, "Pipeline stopped"),
        }
    }
}
