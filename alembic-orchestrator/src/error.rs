//! Orchestration error taxonomy
//!
//! Every failure names the chunk that ended the run, so operators can
//! re-invoke the run on the remaining range. A poll timeout is kept
//! distinct from a service-reported failure status: "the service never
//! answered" and "the service reported failure" are different incidents.

use std::time::Duration;

use alembic_client::ClientError;
use alembic_core::domain::{CustomId, JobId, JobStatus};
use thiserror::Error;

/// Errors that can end an orchestration run
#[derive(Debug, Error)]
pub enum RunError {
    /// Bad run configuration, surfaced before any submission occurs
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Submission or status query failed at the transport layer
    #[error("chunk {chunk}: transport failure: {source}")]
    Transport {
        chunk: usize,
        #[source]
        source: ClientError,
    },

    /// The service reported a failure terminal status for the chunk's job
    #[error("chunk {chunk}: job {job} ended with status {status}")]
    JobFailed {
        chunk: usize,
        job: JobId,
        status: JobStatus,
    },

    /// The job never reached a terminal status within the per-job wait
    #[error("chunk {chunk}: job {job} not terminal after {waited:?}")]
    PollTimeout {
        chunk: usize,
        job: JobId,
        waited: Duration,
    },

    /// The completed job's results could not be fetched or decoded
    #[error("chunk {chunk}: result fetch failed: {source}")]
    ResultFetch {
        chunk: usize,
        #[source]
        source: ClientError,
    },

    /// Internal-consistency fault: two chunks produced the same custom id
    #[error("chunk {chunk}: duplicate result for {custom_id}")]
    DuplicateResult { chunk: usize, custom_id: CustomId },
}

impl RunError {
    /// The chunk that ended the run, if the failure is chunk-scoped
    pub fn chunk(&self) -> Option<usize> {
        match self {
            RunError::InvalidConfiguration(_) => None,
            RunError::Transport { chunk, .. }
            | RunError::JobFailed { chunk, .. }
            | RunError::PollTimeout { chunk, .. }
            | RunError::ResultFetch { chunk, .. }
            | RunError::DuplicateResult { chunk, .. } => Some(*chunk),
        }
    }
}
