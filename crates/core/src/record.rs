//! Externally observed operation state.
//!
//! An [`OperationRecord`] is what a UI binds to while a job-backed
//! operation runs. It only ever changes by applying an
//! [`OperationEvent`], which keeps the record's invariants in one place:
//!
//! * `error` is set if and only if `status` is [`RecordStatus::Failed`].
//! * `progress_stage` / `progress_value` are only set while loading.
//! * a failure keeps the last known `value`; only [`OperationRecord::reset`]
//!   clears it.

use serde::{Deserialize, Serialize};

/// Coarse lifecycle of an operation as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Event produced by an operation or pipeline while it runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OperationEvent<T> {
    /// Work was requested but nothing has been created yet.
    Pending,
    /// The job-backed entity was created on the server.
    Created { partial: Option<T> },
    /// The running job reported progress. `value` is `None` when the job
    /// cannot estimate its progress.
    Progress {
        stage: String,
        value: Option<f64>,
        partial: Option<T>,
    },
    /// The operation finished; carries the final value.
    Succeeded(T),
    /// The operation failed; carries the error message.
    Failed(String),
}

/// Terminal-safe state of one operation or pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord<T> {
    pub value: Option<T>,
    pub status: RecordStatus,
    pub error: Option<String>,
    pub progress_stage: Option<String>,
    pub progress_value: Option<f64>,
}

impl<T> Default for OperationRecord<T> {
    fn default() -> Self {
        Self {
            value: None,
            status: RecordStatus::Idle,
            error: None,
            progress_stage: None,
            progress_value: None,
        }
    }
}

impl<T> OperationRecord<T> {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.status == RecordStatus::Loading
    }

    /// Whether the record reached `succeeded` or `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, RecordStatus::Succeeded | RecordStatus::Failed)
    }

    /// Return to the idle state, dropping the retained value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply one event to the record.
    pub fn apply(&mut self, event: OperationEvent<T>) {
        match event {
            OperationEvent::Pending => self.start_loading(None),
            OperationEvent::Created { partial } => self.start_loading(partial),
            OperationEvent::Progress {
                stage,
                value,
                partial,
            } => {
                self.start_loading(partial);
                self.progress_stage = Some(stage);
                self.progress_value = value;
            }
            OperationEvent::Succeeded(value) => {
                self.value = Some(value);
                self.status = RecordStatus::Succeeded;
                self.error = None;
                self.clear_progress();
            }
            OperationEvent::Failed(error) => {
                self.status = RecordStatus::Failed;
                self.error = Some(error);
                self.clear_progress();
            }
        }
    }

    // ---- private helpers ----

    fn start_loading(&mut self, partial: Option<T>) {
        if let Some(partial) = partial {
            self.value = Some(partial);
        }
        self.status = RecordStatus::Loading;
        self.error = None;
        self.clear_progress();
    }

    fn clear_progress(&mut self) {
        self.progress_stage = None;
        self.progress_value = None;
    }
}
