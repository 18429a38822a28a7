//! Job backends
//!
//! The orchestrator submits chunks through the [`JobBackend`] trait and
//! never learns how inference actually happens. [`BatchBackend`] maps a
//! chunk onto one asynchronous batch job; [`InlineBackend`] calls the
//! per-item endpoint synchronously and reports an already-terminal job.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use alembic_core::domain::{BatchJob, Chunk, JobId, JobStatus, RequestCounts, ResultMap};
use alembic_core::dto::{RequestRecord, ResultRecord};

use crate::ServiceClient;
use crate::error::{ClientError, Result};

/// Interface between the orchestrator and the inference service.
///
/// Submission is not retried here; retry policy belongs to the caller,
/// because creating a job has side effects that make blind retry unsafe.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Submit one chunk's requests as a single job, returning its id
    async fn submit(&self, chunk: &Chunk, requests: &[RequestRecord]) -> Result<JobId>;

    /// Query the current state of a previously submitted job
    async fn status(&self, job: &JobId) -> Result<BatchJob>;

    /// Retrieve and parse the results of a completed job.
    ///
    /// Valid only once the job reports [`JobStatus::Completed`]; fails
    /// with [`ClientError::IncompleteJob`] otherwise.
    async fn fetch_results(&self, job: &JobId) -> Result<ResultMap>;
}

/// Serializes request records to a JSONL file, one record per line
fn write_request_file(path: &Path, requests: &[RequestRecord]) -> Result<()> {
    let mut payload = String::new();
    for record in requests {
        let line = serde_json::to_string(record)
            .map_err(|e| ClientError::InternalError(format!("cannot serialize request: {e}")))?;
        payload.push_str(&line);
        payload.push('\n');
    }

    std::fs::write(path, payload)
        .map_err(|e| ClientError::InternalError(format!("cannot write {}: {e}", path.display())))
}

/// Parses a completed job's output artifact into a result map.
///
/// Each artifact line contributes one result entry under its custom id;
/// entries for the same id keep artifact order.
fn parse_output_artifact(content: &str) -> Result<ResultMap> {
    let mut results = ResultMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: ResultRecord = serde_json::from_str(line)
            .map_err(|e| ClientError::ParseError(format!("malformed result record: {e}")))?;

        results
            .entry(record.custom_id.clone())
            .or_default()
            .push(record.output_text());
    }

    Ok(results)
}

/// Backend submitting a chunk as one asynchronous batch job
pub struct BatchBackend {
    client: ServiceClient,
    /// Directory where per-chunk request payloads are written
    working_dir: PathBuf,
    /// Endpoint path each request targets
    endpoint: String,
}

impl BatchBackend {
    pub fn new(
        client: ServiceClient,
        working_dir: impl Into<PathBuf>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            working_dir: working_dir.into(),
            endpoint: endpoint.into(),
        }
    }

    fn request_file_path(&self, chunk: &Chunk) -> PathBuf {
        self.working_dir.join(format!("requests-{:04}.jsonl", chunk.seq))
    }
}

#[async_trait]
impl JobBackend for BatchBackend {
    async fn submit(&self, chunk: &Chunk, requests: &[RequestRecord]) -> Result<JobId> {
        std::fs::create_dir_all(&self.working_dir).map_err(|e| {
            ClientError::InternalError(format!(
                "cannot create {}: {e}",
                self.working_dir.display()
            ))
        })?;

        let path = self.request_file_path(chunk);
        write_request_file(&path, requests)?;
        debug!(
            chunk = chunk.seq,
            requests = requests.len(),
            path = %path.display(),
            "wrote chunk request payload"
        );

        let uploaded = self.client.upload_batch_file(&path).await?;
        let job = self.client.create_batch(&uploaded.id, &self.endpoint).await?;

        info!(chunk = chunk.seq, job = %job.id, "batch job created");

        Ok(job.id)
    }

    async fn status(&self, job: &JobId) -> Result<BatchJob> {
        self.client.retrieve_batch(job).await
    }

    async fn fetch_results(&self, job: &JobId) -> Result<ResultMap> {
        let batch = self.client.retrieve_batch(job).await?;

        if !batch.status.is_success() {
            return Err(ClientError::IncompleteJob {
                job: job.clone(),
                status: batch.status,
            });
        }

        let output_file_id = batch.output_file_id.ok_or_else(|| {
            ClientError::ParseError(format!("completed job {job} has no output file"))
        })?;

        let content = self.client.file_content(&output_file_id).await?;
        parse_output_artifact(&content)
    }
}

struct InlineJob {
    counts: RequestCounts,
    results: ResultMap,
}

/// Backend performing one synchronous call per item.
///
/// `submit` runs every request before returning and caches the outcome
/// under a locally generated job id, so the job is already terminal by
/// the time the poller first looks at it.
pub struct InlineBackend {
    client: ServiceClient,
    /// Pause between consecutive item calls (service politeness)
    request_delay: Duration,
    jobs: Mutex<HashMap<JobId, InlineJob>>,
}

impl InlineBackend {
    pub fn new(client: ServiceClient, request_delay: Duration) -> Self {
        Self {
            client,
            request_delay,
            jobs: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl JobBackend for InlineBackend {
    async fn submit(&self, chunk: &Chunk, requests: &[RequestRecord]) -> Result<JobId> {
        let mut counts = RequestCounts::default();
        let mut results = ResultMap::new();

        for record in requests {
            counts.total += 1;

            match self.client.create_response(&record.url, &record.body).await {
                Ok(response) => {
                    counts.completed += 1;
                    results
                        .entry(record.custom_id.clone())
                        .or_default()
                        .push(response.output_text());
                }
                Err(e) => {
                    // A failed item mirrors a failed request inside a batch
                    // job: counted, absent from the results.
                    warn!(custom_id = %record.custom_id, error = %e, "inline request failed");
                    counts.failed += 1;
                }
            }

            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        let id = JobId::new(format!("inline-{}", Uuid::new_v4()));
        info!(
            chunk = chunk.seq,
            job = %id,
            completed = counts.completed,
            failed = counts.failed,
            "inline chunk processed"
        );

        self.jobs
            .lock()
            .expect("inline job table poisoned")
            .insert(id.clone(), InlineJob { counts, results });

        Ok(id)
    }

    async fn status(&self, job: &JobId) -> Result<BatchJob> {
        let jobs = self.jobs.lock().expect("inline job table poisoned");
        let entry = jobs.get(job).ok_or_else(|| ClientError::UnknownJob(job.clone()))?;

        Ok(BatchJob {
            id: job.clone(),
            status: JobStatus::Completed,
            request_counts: entry.counts,
            output_file_id: None,
        })
    }

    async fn fetch_results(&self, job: &JobId) -> Result<ResultMap> {
        let mut jobs = self.jobs.lock().expect("inline job table poisoned");
        let entry = jobs
            .remove(job)
            .ok_or_else(|| ClientError::UnknownJob(job.clone()))?;

        Ok(entry.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alembic_core::domain::CustomId;
    use alembic_core::dto::{PromptMessage, RequestBody};

    fn request(index: usize) -> RequestRecord {
        RequestRecord::new(
            CustomId::from_index(index),
            "/v1/responses",
            RequestBody {
                model: "teacher-xl".to_string(),
                max_output_tokens: 256,
                temperature: 1.0,
                input: vec![
                    PromptMessage::system("instructions"),
                    PromptMessage::user(format!("req-{index}")),
                ],
            },
        )
    }

    #[test]
    fn request_file_is_one_record_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requests-0000.jsonl");

        write_request_file(&path, &[request(0), request(1)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["custom_id"], "item-0");
        assert_eq!(first["body"]["input"][1]["content"], "req-0");
    }

    #[test]
    fn artifact_lines_group_by_custom_id() {
        let artifact = concat!(
            r#"{"custom_id":"item-0","response":{"body":{"output":[{"type":"message","content":[{"type":"output_text","text":"first"}]}]}}}"#,
            "\n",
            r#"{"custom_id":"item-0","response":{"body":{"output":[{"type":"message","content":[{"type":"output_text","text":"second"}]}]}}}"#,
            "\n\n",
            r#"{"custom_id":"item-2","response":{"body":{"output":[{"type":"message","content":[{"type":"output_text","text":"third"}]}]}}}"#,
            "\n",
        );

        let results = parse_output_artifact(artifact).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[&CustomId::from_index(0)],
            vec!["first".to_string(), "second".to_string()]
        );
        assert_eq!(results[&CustomId::from_index(2)], vec!["third".to_string()]);
    }

    #[test]
    fn malformed_artifact_line_is_a_parse_error() {
        let err = parse_output_artifact("not json\n").unwrap_err();
        assert!(matches!(err, ClientError::ParseError(_)));
    }
}
