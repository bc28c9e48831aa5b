//! Fixed-interval job polling with cooperative cancellation.
//!
//! [`Poller::poll`] repeatedly fetches one job until it reaches a terminal
//! status or the caller's [`CancellationToken`] is triggered. Between
//! fetches it sleeps for [`PollConfig::interval`]; that delay is the only
//! backpressure applied to the job service. There is no deadline: a job
//! that never settles is polled until the caller cancels.

use std::time::Duration;

use sparsify_core::error::JobError;
use sparsify_core::job::{JobHandle, JobStatus, RawProgress};
use tokio_util::sync::CancellationToken;

use crate::service::JobService;

/// Default delay between two fetches of the same job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tunable parameters for the poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between the end of one fetch and the start of the next.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// How a poll loop ended without error.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The job reached `completed` or `canceled` on its own.
    Settled(JobHandle),
    /// The caller cancelled; carries the cancel request's acknowledgement.
    /// The job is not re-fetched, so it may still be `canceling`.
    CancelRequested(JobHandle),
}

/// Callback receiving each non-terminal cycle's raw progress.
pub type ProgressFn<'a> = dyn FnMut(Option<&RawProgress>) + Send + 'a;

/// Drives fetch-and-decide cycles for jobs on one service.
pub struct Poller<'a, S: ?Sized> {
    service: &'a S,
    config: PollConfig,
}

impl<'a, S> Poller<'a, S>
where
    S: JobService + ?Sized,
{
    pub fn new(service: &'a S, config: PollConfig) -> Self {
        Self { service, config }
    }

    /// Poll `job_id` until it settles or `cancel` is triggered.
    ///
    /// Each cycle:
    /// 1. fetch the job;
    /// 2. `error` status fails with the job's message;
    /// 3. `completed`/`canceled` returns [`PollOutcome::Settled`];
    /// 4. otherwise `on_progress` receives the raw progress;
    /// 5. sleep for the configured interval;
    /// 6. if cancelled, send one cancel request and return its result,
    ///    else continue with the job id from the latest fetch.
    ///
    /// Fetch and cancel failures are reported as [`JobError::Service`].
    pub async fn poll(
        &self,
        job_id: &str,
        mut on_progress: Option<&mut ProgressFn<'_>>,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, JobError> {
        let mut job_id = job_id.to_string();
        let mut cycle = 0u64;

        loop {
            cycle += 1;

            let job = match self.service.get_job(&job_id).await {
                Ok(job) => job,
                Err(source) => {
                    tracing::warn!(job_id = %job_id, cycle, error = %source, "Failed to fetch job");
                    return Err(JobError::Service { job_id, source });
                }
            };

            tracing::trace!(job_id = %job.job_id, status = %job.status, cycle, "Polled job");

            match job.status {
                JobStatus::Error => {
                    let message = job
                        .error
                        .unwrap_or_else(|| format!("Job {} failed without an error message", job.job_id));
                    tracing::warn!(job_id = %job.job_id, error = %message, "Job failed");
                    return Err(JobError::Failed {
                        job_id: job.job_id,
                        message,
                    });
                }
                JobStatus::Completed | JobStatus::Canceled => {
                    tracing::debug!(job_id = %job.job_id, status = %job.status, cycle, "Job settled");
                    return Ok(PollOutcome::Settled(job));
                }
                JobStatus::Pending | JobStatus::Started | JobStatus::Canceling => {}
            }

            if let Some(callback) = on_progress.as_deref_mut() {
                callback(job.progress.as_ref());
            }

            tokio::time::sleep(self.config.interval).await;
            job_id = job.job_id;

            if cancel.is_cancelled() {
                tracing::info!(job_id = %job_id, cycle, "Cancelling job");
                return match self.service.cancel_job(&job_id).await {
                    Ok(ack) => Ok(PollOutcome::CancelRequested(ack)),
                    Err(source) => Err(JobError::Service { job_id, source }),
                };
            }
        }
    }
}
