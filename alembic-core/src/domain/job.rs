//! Job domain types
//!
//! A job is one submission unit tracked by the external batch service.
//! Its identity never changes after creation; only the status and the
//! request counts transition over time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque job identifier assigned by the service on submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a job as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[serde(rename = "validating")]
    Pending,
    #[serde(alias = "finalizing")]
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl JobStatus {
    /// Whether no further status transition can occur
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::InProgress)
    }

    /// Whether this is the success terminal status
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }

    /// Whether this is a failure terminal status
    pub fn is_failure(&self) -> bool {
        self.is_terminal() && !self.is_success()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Pending => "validating",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// Per-job request progress counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCounts {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
}

/// One submission to the external service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub request_counts: RequestCounts,
    /// Handle to the output artifact, present once the job completed
    #[serde(default)]
    pub output_file_id: Option<String>,
}
