//! Run configuration
//!
//! Everything a labeling run needs beyond the items themselves: how to
//! bound chunks, how patiently to poll each job, and the template every
//! per-item request is built from.

use std::time::Duration;

use alembic_core::domain::{ChunkBound, CustomId};
use alembic_core::dto::{PromptMessage, RequestBody, RequestRecord};

use crate::error::RunError;

/// Default service endpoint path each request targets
const DEFAULT_ENDPOINT: &str = "/v1/responses";

const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 256;
const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Template for every request of a run.
///
/// The system prompt and model parameters are fixed per run; only the
/// user payload varies per item. `temperature` and `max_output_tokens`
/// are pass-through parameters with no behavioral guarantee from the
/// service for batch jobs.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    pub model: String,
    pub system_prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    /// Endpoint path recorded on each request
    pub endpoint: String,
}

impl RequestTemplate {
    pub fn new(model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Builds the request record for one item
    pub fn record(&self, custom_id: CustomId, user_payload: String) -> RequestRecord {
        RequestRecord::new(
            custom_id,
            self.endpoint.clone(),
            RequestBody {
                model: self.model.clone(),
                max_output_tokens: self.max_output_tokens,
                temperature: self.temperature,
                input: vec![
                    PromptMessage::system(self.system_prompt.clone()),
                    PromptMessage::user(user_payload),
                ],
            },
        )
    }
}

/// Configuration for one orchestration run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// How chunk sizes are bounded
    pub chunk_bound: ChunkBound,
    /// Fixed spacing between status queries for a submitted job
    pub poll_interval: Duration,
    /// Maximum wait for a single job to reach a terminal status
    pub max_wait: Duration,
    /// Template every per-item request is built from
    pub request: RequestTemplate,
}

impl RunConfig {
    /// Creates a configuration with the service's coarse-grained batch
    /// cadence: one status query per minute, for at most a day per job.
    pub fn new(chunk_bound: ChunkBound, request: RequestTemplate) -> Self {
        Self {
            chunk_bound,
            poll_interval: Duration::from_secs(60),
            max_wait: Duration::from_secs(24 * 60 * 60),
            request,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Validates the configuration and resolves the items-per-chunk bound.
    ///
    /// Fails before anything is submitted.
    pub(crate) fn items_per_chunk(&self) -> Result<usize, RunError> {
        if self.poll_interval.is_zero() {
            return Err(RunError::InvalidConfiguration(
                "poll interval must be positive".to_string(),
            ));
        }

        self.chunk_bound.resolve().ok_or_else(|| {
            RunError::InvalidConfiguration(format!(
                "chunk bound resolves to zero items per chunk: {:?}",
                self.chunk_bound
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> RequestTemplate {
        RequestTemplate::new("teacher-xl", "label the state")
    }

    #[test]
    fn template_builds_two_part_prompt() {
        let record = template().record(CustomId::from_index(4), "state text".to_string());

        assert_eq!(record.custom_id.as_str(), "item-4");
        assert_eq!(record.method, "POST");
        assert_eq!(record.url, "/v1/responses");
        assert_eq!(record.body.input.len(), 2);
        assert_eq!(record.body.input[0].role, "system");
        assert_eq!(record.body.input[0].content, "label the state");
        assert_eq!(record.body.input[1].role, "user");
        assert_eq!(record.body.input[1].content, "state text");
    }

    #[test]
    fn items_bound_resolves() {
        let config = RunConfig::new(ChunkBound::Items(8), template());
        assert_eq!(config.items_per_chunk().unwrap(), 8);
    }

    #[test]
    fn zero_items_bound_is_invalid() {
        let config = RunConfig::new(ChunkBound::Items(0), template());
        assert!(matches!(
            config.items_per_chunk(),
            Err(RunError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn zero_poll_interval_is_invalid() {
        let config = RunConfig::new(ChunkBound::Items(4), template())
            .with_poll_interval(Duration::ZERO);
        assert!(matches!(
            config.items_per_chunk(),
            Err(RunError::InvalidConfiguration(_))
        ));
    }
}
