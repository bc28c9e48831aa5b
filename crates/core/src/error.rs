//! Error taxonomy shared by the client and pipeline crates.
//!
//! * [`ServiceError`] -- one request to the job service failed.
//! * [`JobError`] -- a job could not be tracked to a successful end.
//! * [`OperationError`] -- a create/poll/fetch operation failed.
//!
//! Every error is `Clone` so it can be fanned out to observers and stored
//! in an operation record as its display string.

use crate::types::JobId;

/// A single request to the job service failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    /// The request failed before any response arrived (network, DNS, TLS).
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status code.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-supplied error message, or the raw body.
        message: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("Invalid response: {0}")]
    Decode(String),
}

/// A job could not be tracked to completion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobError {
    /// The job itself reached the `error` status.
    #[error("{message}")]
    Failed { job_id: JobId, message: String },

    /// A fetch or cancel request for the job failed.
    #[error("Job {job_id}: {source}")]
    Service {
        job_id: JobId,
        #[source]
        source: ServiceError,
    },
}

impl JobError {
    pub fn job_id(&self) -> &str {
        match self {
            Self::Failed { job_id, .. } | Self::Service { job_id, .. } => job_id,
        }
    }
}

/// A job-backed operation failed at some point of its lifecycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperationError {
    /// The creation request was rejected.
    #[error("Failed to start operation: {0}")]
    Create(#[source] ServiceError),

    /// The job failed or could not be polled.
    #[error(transparent)]
    Job(#[from] JobError),

    /// The job finished but the resulting entity could not be fetched.
    #[error("Failed to fetch result: {0}")]
    Fetch(#[source] ServiceError),

    /// The caller cancelled the operation before it finished.
    #[error("Operation cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_failure_displays_server_message_verbatim() {
        let err = JobError::Failed {
            job_id: "j1".into(),
            message: "X".into(),
        };
        assert_eq!(err.to_string(), "X");
        assert_eq!(OperationError::from(err).to_string(), "X");
    }

    #[test]
    fn service_error_while_polling_keeps_job_id() {
        let err = JobError::Service {
            job_id: "j1".into(),
            source: ServiceError::Server {
                status: 404,
                message: "job not found".into(),
            },
        };
        assert_eq!(err.job_id(), "j1");
        assert_eq!(err.to_string(), "Job j1: Server error (404): job not found");
    }
}
