//! Job status model.
//!
//! A [`JobHandle`] is the client's view of one server-side job: its id,
//! lifecycle [`JobStatus`], the raw [`RawProgress`] payload it last
//! reported, and the error message it carries once it fails.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::JobId;

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle position of a server-side job.
///
/// `Completed`, `Canceled` and `Error` are terminal: once a job reports
/// one of them it is never polled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Queued on the server, not yet picked up.
    Pending,
    /// Actively running.
    Started,
    /// A cancel was requested but the job has not stopped yet.
    Canceling,
    /// Finished successfully.
    Completed,
    /// Stopped after a cancel request.
    Canceled,
    /// Failed; the handle's `error` field carries the reason.
    Error,
}

impl JobStatus {
    /// Whether this status ends the job's lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Error)
    }

    /// Wire representation of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Started => "started",
            Self::Canceling => "canceling",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RawProgress
// ---------------------------------------------------------------------------

/// Progress payload exactly as the job service reports it.
///
/// The server sends either an indefinite marker (`iter_indefinite: true`)
/// or a step/iteration breakdown. No field is guaranteed to be present;
/// see [`crate::progress::normalize`] for how the fields combine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProgress {
    /// The job cannot estimate its progress.
    #[serde(default, alias = "iter_indefinite", skip_serializing_if = "Option::is_none")]
    pub indefinite: Option<bool>,
    /// Number of top-level steps the job runs through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_steps: Option<i64>,
    /// Zero-based index of the step currently running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_index: Option<i64>,
    /// Fractional progress (0.0-1.0) within the current step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iter_val: Option<f64>,
    /// Descriptive label for the iteration unit, if the server sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iter_class: Option<String>,
    /// Descriptive label for the current step, if the server sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_class: Option<String>,
}

impl RawProgress {
    /// An indefinite progress marker.
    pub fn indefinite() -> Self {
        Self {
            indefinite: Some(true),
            ..Default::default()
        }
    }

    /// A step/iteration breakdown.
    pub fn steps(num_steps: Option<i64>, step_index: Option<i64>, iter_val: Option<f64>) -> Self {
        Self {
            num_steps,
            step_index,
            iter_val,
            ..Default::default()
        }
    }

    pub fn is_indefinite(&self) -> bool {
        self.indefinite.unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// JobHandle
// ---------------------------------------------------------------------------

/// Snapshot of a job as returned by the job service.
///
/// Handles are never mutated in place: each fetch replaces the previous
/// snapshot wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: Option<RawProgress>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobHandle {
    /// Create a handle with no progress and no error.
    pub fn new(job_id: impl Into<JobId>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            progress: None,
            error: None,
        }
    }

    /// Attach a progress payload.
    pub fn with_progress(mut self, progress: RawProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Attach an error message.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Started.is_terminal());
        assert!(!JobStatus::Canceling.is_terminal());
    }

    #[test]
    fn status_uses_lowercase_wire_names() {
        let status: JobStatus = serde_json::from_str("\"canceling\"").unwrap();
        assert_eq!(status, JobStatus::Canceling);
        assert_eq!(serde_json::to_string(&JobStatus::Error).unwrap(), "\"error\"");
        assert_eq!(JobStatus::Started.to_string(), "started");
    }

    #[test]
    fn handle_deserializes_server_job_payload() {
        let handle: JobHandle = serde_json::from_value(serde_json::json!({
            "job_id": "abc",
            "project_id": "p1",
            "type": "CreatePerfProfileJobWorker",
            "status": "started",
            "progress": {
                "iter_indefinite": false,
                "iter_class": "analysis",
                "iter_val": 0.25,
                "num_steps": 2,
                "step_class": "baseline",
                "step_index": 1
            },
            "error": null
        }))
        .unwrap();

        assert_eq!(handle.job_id, "abc");
        assert_eq!(handle.status, JobStatus::Started);
        let progress = handle.progress.expect("progress should be present");
        assert!(!progress.is_indefinite());
        assert_eq!(progress.num_steps, Some(2));
        assert_eq!(progress.step_index, Some(1));
        assert_eq!(progress.iter_val, Some(0.25));
        assert_eq!(progress.step_class.as_deref(), Some("baseline"));
        assert!(handle.error.is_none());
    }

    #[test]
    fn handle_tolerates_missing_optional_fields() {
        let handle: JobHandle =
            serde_json::from_value(serde_json::json!({"job_id": "j", "status": "pending"}))
                .unwrap();
        assert!(handle.progress.is_none());
        assert!(handle.error.is_none());
        assert!(!handle.is_terminal());
    }

    #[test]
    fn indefinite_marker_accepts_short_name() {
        let progress: RawProgress =
            serde_json::from_value(serde_json::json!({"indefinite": true})).unwrap();
        assert!(progress.is_indefinite());
    }
}
