//! Optional observation hook for pipelines.
//!
//! A [`Pipeline`](crate::Pipeline) forwards every per-stage operation
//! event to an injected [`PipelineObserver`], if one was given. Two
//! observers ship with the crate: [`TracingObserver`] logs events, and
//! [`EventFeed`] fans them out over a `tokio::sync::broadcast` channel.

use chrono::Utc;
use serde::Serialize;
use sparsify_core::kinds::Entity;
use sparsify_core::record::OperationEvent;
use sparsify_core::types::Timestamp;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// PipelineEvent
// ---------------------------------------------------------------------------

/// A stage-level event as seen by observers.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineEvent {
    /// Name of the stage that produced the event.
    pub stage: String,
    /// The stage operation's event, with stage-local progress.
    pub event: OperationEvent<Entity>,
    /// Progress rescaled into the pipeline range, for progress events.
    pub pipeline_progress: Option<f64>,
    /// When the event was observed (UTC).
    pub timestamp: Timestamp,
}

impl PipelineEvent {
    pub fn new(stage: impl Into<String>, event: OperationEvent<Entity>) -> Self {
        Self {
            stage: stage.into(),
            event,
            pipeline_progress: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_pipeline_progress(mut self, progress: Option<f64>) -> Self {
        self.pipeline_progress = progress;
        self
    }
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

/// Receives stage events from a running pipeline.
///
/// Called inline on the pipeline's task; implementations must not block.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Logs every pipeline event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match &event.event {
            OperationEvent::Pending => {
                tracing::debug!(stage = %event.stage, "Stage pending");
            }
            OperationEvent::Created { partial } => {
                tracing::info!(
                    stage = %event.stage,
                    entity = ?partial.as_ref().map(|e| e.reference.to_string()),
                    "Stage created",
                );
            }
            OperationEvent::Progress { value, .. } => {
                tracing::debug!(
                    stage = %event.stage,
                    stage_progress = ?value,
                    pipeline_progress = ?event.pipeline_progress,
                    "Stage progress",
                );
            }
            OperationEvent::Succeeded(entity) => {
                tracing::info!(stage = %event.stage, entity = %entity.reference, "Stage succeeded");
            }
            OperationEvent::Failed(error) => {
                tracing::warn!(stage = %event.stage, error = %error, "Stage failed");
            }
        }
    }
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Fan-out feed of pipeline events.
///
/// Any number of subscribers independently receive every event. Slow
/// receivers observe `RecvError::Lagged` once the buffer overflows.
pub struct EventFeed {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PipelineObserver for EventFeed {
    fn on_event(&self, event: &PipelineEvent) {
        // A send error only means there are no subscribers.
        let _ = self.sender.send(event.clone());
    }
}
