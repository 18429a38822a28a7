//! Batch-related service endpoints

use std::path::Path;

use serde::{Deserialize, Serialize};

use alembic_core::domain::{BatchJob, JobId};
use alembic_core::dto::{InferenceResponse, RequestBody};

use crate::ServiceClient;
use crate::error::{ClientError, Result};

/// Handle returned by the file-upload endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub id: String,
}

#[derive(Debug, Serialize)]
struct CreateBatchRequest<'a> {
    input_file_id: &'a str,
    endpoint: &'a str,
    completion_window: &'a str,
}

/// How long the service is given to finish a batch job
const COMPLETION_WINDOW: &str = "24h";

impl ServiceClient {
    /// Upload a chunk's JSONL request payload for batch processing
    ///
    /// # Arguments
    /// * `path` - Local path of the JSONL file to upload
    ///
    /// # Returns
    /// The service-side handle of the uploaded file
    pub async fn upload_batch_file(&self, path: &Path) -> Result<UploadedFile> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::InternalError(format!("cannot read {}: {e}", path.display())))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "requests.jsonl".to_string());

        let form = reqwest::multipart::Form::new()
            .text("purpose", "batch")
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let response = self
            .request(reqwest::Method::POST, "/v1/files")
            .multipart(form)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Create an asynchronous batch job from an uploaded request file
    ///
    /// # Arguments
    /// * `input_file_id` - Handle returned by [`ServiceClient::upload_batch_file`]
    /// * `endpoint` - Service endpoint path each request targets
    ///
    /// # Returns
    /// The created job, including its service-assigned id
    pub async fn create_batch(&self, input_file_id: &str, endpoint: &str) -> Result<BatchJob> {
        let response = self
            .request(reqwest::Method::POST, "/v1/batches")
            .json(&CreateBatchRequest {
                input_file_id,
                endpoint,
                completion_window: COMPLETION_WINDOW,
            })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Retrieve the current state of a batch job
    ///
    /// A single non-blocking status query; polling cadence is the
    /// caller's concern.
    pub async fn retrieve_batch(&self, job: &JobId) -> Result<BatchJob> {
        let response = self
            .request(reqwest::Method::GET, &format!("/v1/batches/{job}"))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Download the raw content of a service-side file
    ///
    /// Used for the output artifact of a completed batch job.
    pub async fn file_content(&self, file_id: &str) -> Result<String> {
        let response = self
            .request(reqwest::Method::GET, &format!("/v1/files/{file_id}/content"))
            .send()
            .await?;

        self.handle_text_response(response).await
    }

    /// Perform one synchronous inference call
    ///
    /// # Arguments
    /// * `path` - Endpoint path (the same path batch requests carry)
    /// * `body` - Model parameters and the two-part prompt
    pub async fn create_response(&self, path: &str, body: &RequestBody) -> Result<InferenceResponse> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
