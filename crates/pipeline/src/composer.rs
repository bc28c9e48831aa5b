//! Sequential composition of job-backed operations.
//!
//! A [`Pipeline`] runs its enabled stages one after another through an
//! [`Orchestrator`], rescales each stage's progress into the stage's
//! window, and reports pipeline-level [`OperationEvent`]s whose value is
//! the list of [`StageOutput`]s produced so far.
//!
//! The first failing stage aborts the pipeline. Outputs of stages that
//! already finished stay in the reported value; nothing is rolled back
//! and nothing is retried.

use std::sync::Arc;

use sparsify_client::operation::Orchestrator;
use sparsify_client::poller::PollConfig;
use sparsify_client::service::JobService;
use sparsify_core::error::OperationError;
use sparsify_core::kinds::Entity;
use sparsify_core::record::OperationEvent;
use tokio_util::sync::CancellationToken;

use crate::observer::{PipelineEvent, PipelineObserver};
use crate::stage::{plan_windows, PipelineStage, StageOutput};

/// Receives pipeline-level events, in order.
pub type PipelineSink<'a> = dyn FnMut(OperationEvent<Vec<StageOutput>>) + Send + 'a;

/// Runs weighted sequences of operations against one job service.
pub struct Pipeline {
    service: Arc<dyn JobService>,
    poll: PollConfig,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl Pipeline {
    pub fn new(service: Arc<dyn JobService>) -> Self {
        Self {
            service,
            poll: PollConfig::default(),
            observer: None,
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Forward every stage event to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn service(&self) -> &dyn JobService {
        self.service.as_ref()
    }

    /// Run the enabled stages of `stages` in order.
    ///
    /// Emits `Pending` first, `Created` whenever a stage creates its
    /// entity, rescaled `Progress` while a stage runs, and finally
    /// `Succeeded` with every stage output or `Failed` with the aborting
    /// error. Disabled stages produce no events. A pipeline without
    /// enabled stages succeeds with an empty output list.
    pub async fn run(
        &self,
        stages: &[PipelineStage],
        sink: &mut PipelineSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<StageOutput>, PipelineError> {
        let result = self.run_stages(stages, sink, cancel).await;

        match &result {
            Ok(outputs) => {
                tracing::info!(stages = outputs.len(), "Pipeline succeeded");
                sink(OperationEvent::Succeeded(outputs.clone()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Pipeline aborted");
                sink(OperationEvent::Failed(e.record_message()));
            }
        }

        result
    }

    // ---- private helpers ----

    async fn run_stages(
        &self,
        stages: &[PipelineStage],
        sink: &mut PipelineSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<StageOutput>, PipelineError> {
        if let Some(stage) = stages
            .iter()
            .find(|s| s.enabled && !(s.weight.is_finite() && s.weight > 0.0))
        {
            return Err(PipelineError::InvalidWeight {
                stage: stage.name.clone(),
                weight: stage.weight,
            });
        }

        sink(OperationEvent::Pending);

        let orchestrator = Orchestrator::new(self.service.as_ref(), self.poll.clone());
        let observer = self.observer.as_deref();
        let mut outputs: Vec<StageOutput> = Vec::new();

        for (index, window) in plan_windows(stages) {
            let stage = &stages[index];

            if cancel.is_cancelled() {
                return Err(PipelineError::Aborted {
                    stage: stage.name.clone(),
                    source: OperationError::Cancelled,
                });
            }

            tracing::info!(
                stage = %stage.name,
                kind = %stage.params.kind,
                window_start = window.start,
                window_span = window.span,
                "Starting pipeline stage",
            );

            let slot = outputs.len();
            let result = {
                let outputs = &mut outputs;
                let sink = &mut *sink;
                let mut on_event = |event: OperationEvent<Entity>| {
                    let pipeline_progress = match &event {
                        OperationEvent::Progress { value, .. } => window.scale(*value),
                        _ => None,
                    };
                    if let Some(observer) = observer {
                        observer.on_event(
                            &PipelineEvent::new(stage.name.clone(), event.clone())
                                .with_pipeline_progress(pipeline_progress),
                        );
                    }

                    match event {
                        OperationEvent::Created {
                            partial: Some(entity),
                        } => {
                            outputs.push(StageOutput {
                                stage: stage.name.clone(),
                                entity,
                            });
                            sink(OperationEvent::Created {
                                partial: Some(outputs.clone()),
                            });
                        }
                        OperationEvent::Progress { .. } => {
                            sink(OperationEvent::Progress {
                                stage: stage.name.clone(),
                                value: pipeline_progress,
                                partial: None,
                            });
                        }
                        OperationEvent::Succeeded(entity) => {
                            if let Some(output) = outputs.get_mut(slot) {
                                output.entity = entity;
                            }
                        }
                        OperationEvent::Pending
                        | OperationEvent::Created { partial: None }
                        | OperationEvent::Failed(_) => {}
                    }
                };

                orchestrator
                    .execute(&stage.params, &stage.name, &mut on_event, cancel)
                    .await
            };

            if let Err(source) = result {
                return Err(PipelineError::Aborted {
                    stage: stage.name.clone(),
                    source,
                });
            }
        }

        Ok(outputs)
    }
}

/// Errors that end a pipeline run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// A stage failed; later stages never started.
    #[error("{stage} failed: {source}")]
    Aborted {
        stage: String,
        #[source]
        source: OperationError,
    },

    /// An enabled stage has a weight that is not a positive number.
    #[error("Stage '{stage}' has invalid weight {weight}")]
    InvalidWeight { stage: String, weight: f64 },

    /// The pipeline task panicked or was aborted.
    #[error("Pipeline task ended unexpectedly: {0}")]
    Interrupted(String),

    /// No pipeline run was started.
    #[error("No pipeline has been started")]
    NotStarted,
}

impl PipelineError {
    /// Message stored in the operation record. A stage failure surfaces
    /// the stage's own error unchanged.
    pub fn record_message(&self) -> String {
        match self {
            Self::Aborted { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }

    /// Name of the stage that aborted the pipeline, if any.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Aborted { stage, .. } | Self::InvalidWeight { stage, .. } => Some(stage),
            Self::Interrupted(_) | Self::NotStarted => None,
        }
    }
}
