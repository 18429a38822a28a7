//! Job poller
//!
//! Waits for a submitted job to reach a terminal status by querying the
//! backend on a fixed interval. Batch jobs move slowly, so there is no
//! backoff; the interval is the service's coarse-grained cadence.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use alembic_core::domain::{BatchJob, JobId};
use alembic_client::JobBackend;

use crate::error::RunError;

/// Outcome of waiting on one job
#[derive(Debug)]
pub enum PollVerdict {
    /// The job reached a terminal status (success or failure)
    Terminal(BatchJob),
    /// The run was cancelled while waiting
    Cancelled,
}

/// Fixed-interval wait for a job's terminal status
pub struct Poller {
    backend: Arc<dyn JobBackend>,
    interval: Duration,
    max_wait: Duration,
}

impl Poller {
    pub fn new(backend: Arc<dyn JobBackend>, interval: Duration, max_wait: Duration) -> Self {
        Self {
            backend,
            interval,
            max_wait,
        }
    }

    /// How many status queries fit into the maximum wait, never below one
    fn attempt_budget(&self) -> u32 {
        let interval_ms = self.interval.as_millis().max(1);
        (self.max_wait.as_millis() / interval_ms).max(1) as u32
    }

    /// Polls until the job is terminal, the wait budget is exhausted, or
    /// the run is cancelled.
    ///
    /// Exhausting the budget is [`RunError::PollTimeout`] — deliberately
    /// distinct from any service-reported status, including `Expired`.
    pub async fn wait_for_terminal(
        &self,
        chunk: usize,
        job: &JobId,
        cancel: &CancellationToken,
    ) -> Result<PollVerdict, RunError> {
        let budget = self.attempt_budget();

        for attempt in 1..=budget {
            if cancel.is_cancelled() {
                return Ok(PollVerdict::Cancelled);
            }

            let batch = self
                .backend
                .status(job)
                .await
                .map_err(|source| RunError::Transport { chunk, source })?;

            info!(
                job = %job,
                attempt,
                status = %batch.status,
                completed = batch.request_counts.completed,
                total = batch.request_counts.total,
                failed = batch.request_counts.failed,
                "job progress"
            );

            if batch.status.is_terminal() {
                return Ok(PollVerdict::Terminal(batch));
            }

            if attempt < budget {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(PollVerdict::Cancelled),
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
        }

        Err(RunError::PollTimeout {
            chunk,
            job: job.clone(),
            waited: self.interval * budget,
        })
    }
}
