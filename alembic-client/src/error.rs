//! Error types for the service client

use alembic_core::domain::{JobId, JobStatus};
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the inference service
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (network, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Service returned an error status code
    #[error("service error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// Failed to decode a service payload or artifact
    #[error("failed to parse response: {0}")]
    ParseError(String),

    /// Results were requested for a job that has not completed
    #[error("job {job} is not complete (status: {status})")]
    IncompleteJob { job: JobId, status: JobStatus },

    /// Job id unknown to this backend
    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    /// Local failure while preparing or handling a request payload
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }
}
