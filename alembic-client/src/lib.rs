//! Alembic Service Client
//!
//! A type-safe HTTP client for the external inference service, plus the
//! [`JobBackend`] abstraction the orchestrator drives: submit a chunk of
//! requests, query job status, fetch per-item results.
//!
//! Two backends satisfy the same interface: [`BatchBackend`] submits a
//! chunk as one asynchronous batch job, [`InlineBackend`] performs one
//! synchronous call per item. The orchestrator cannot tell them apart.
//!
//! # Example
//!
//! ```no_run
//! use alembic_client::{BatchBackend, ServiceClient};
//!
//! let client = ServiceClient::new("https://api.example.com", Some("sk-key".into()));
//! let backend = BatchBackend::new(client, "./data/batches", "/v1/responses");
//! ```

pub mod backend;
pub mod error;

mod batches;

pub use backend::{BatchBackend, InlineBackend, JobBackend};
pub use batches::UploadedFile;
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the inference service
///
/// Wraps the endpoints the labeling pipeline needs:
/// - File upload and artifact download
/// - Batch job creation and retrieval
/// - Per-item inference
///
/// One instance is scoped to a single orchestration run and shared by
/// whatever backend drives it; no other state is kept between calls.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    /// Base URL of the service (e.g., "https://api.example.com")
    base_url: String,
    /// Bearer token, if the service requires one
    api_key: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl ServiceClient {
    /// Create a new service client
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    /// Create a new service client with a custom HTTP client
    ///
    /// This allows configuring timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: Option<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("failed to parse JSON response: {e}")))
    }

    /// Handle an API response whose body is plain text (artifact download)
    async fn handle_text_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ServiceClient::new("https://api.example.com", None);
        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ServiceClient::new("https://api.example.com/", Some("sk-key".into()));
        assert_eq!(client.base_url(), "https://api.example.com");
    }
}
