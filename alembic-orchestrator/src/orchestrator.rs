//! Run orchestration
//!
//! Drives Chunker -> Job Client -> Poller -> Result Collector, chunk by
//! chunk. A chunk is never submitted until the previous one reached a
//! terminal state; the first failure aborts the run and preserves what
//! was already collected. Sequential submission respects the service's
//! per-account concurrent-job limits.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use alembic_client::JobBackend;
use alembic_core::domain::{ChunkPlan, CustomId, Dataset, OrderedOutput, PromptReady};

use crate::collector::ResultCollector;
use crate::config::RunConfig;
use crate::error::RunError;
use crate::poller::{PollVerdict, Poller};

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Every chunk was collected
    Completed,
    /// Cancellation was observed; later chunks were never submitted
    Cancelled { completed_chunks: usize },
    /// A chunk failed; later chunks were never submitted
    Failed {
        completed_chunks: usize,
        error: RunError,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }
}

/// Result of one orchestration run.
///
/// The output is always present and index-aligned with the input, even
/// for failed or cancelled runs: slots covered by collected chunks are
/// filled, everything else carries the missing marker.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_items: usize,
    pub output: OrderedOutput,
    pub outcome: RunOutcome,
}

/// Drives a full labeling run against one backend
pub struct Orchestrator {
    backend: Arc<dyn JobBackend>,
    config: RunConfig,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn JobBackend>, config: RunConfig) -> Self {
        Self { backend, config }
    }

    /// Labels every item of the dataset, returning per-item results in
    /// original order.
    ///
    /// Cancellation is checked at every chunk boundary and every poll
    /// tick; a cancelled run returns what was collected so far with a
    /// [`RunOutcome::Cancelled`] outcome, distinct from failure.
    pub async fn run<T: PromptReady>(
        &self,
        items: &Dataset<T>,
        cancel: &CancellationToken,
    ) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = items.len();
        let mut collector = ResultCollector::new();

        let per_chunk = match self.config.items_per_chunk() {
            Ok(per_chunk) => per_chunk,
            Err(error) => {
                return self.finish(
                    run_id,
                    started_at,
                    total,
                    &collector,
                    RunOutcome::Failed {
                        completed_chunks: 0,
                        error,
                    },
                );
            }
        };

        let plan = match ChunkPlan::build(total, per_chunk) {
            Some(plan) => plan,
            None => {
                return self.finish(
                    run_id,
                    started_at,
                    total,
                    &collector,
                    RunOutcome::Failed {
                        completed_chunks: 0,
                        error: RunError::InvalidConfiguration(
                            "items per chunk must be positive".to_string(),
                        ),
                    },
                );
            }
        };

        info!(
            run = %run_id,
            items = total,
            chunks = plan.len(),
            per_chunk,
            "starting labeling run"
        );

        let poller = Poller::new(
            Arc::clone(&self.backend),
            self.config.poll_interval,
            self.config.max_wait,
        );

        let mut completed_chunks = 0;

        for chunk in plan {
            if cancel.is_cancelled() {
                return self.finish(
                    run_id,
                    started_at,
                    total,
                    &collector,
                    RunOutcome::Cancelled { completed_chunks },
                );
            }

            let requests: Vec<_> = items.items()[chunk.indices()]
                .iter()
                .enumerate()
                .map(|(offset, item)| {
                    self.config.request.record(
                        CustomId::from_index(chunk.start + offset),
                        item.to_prompt_text(),
                    )
                })
                .collect();

            info!(
                chunk = chunk.seq,
                start = chunk.start,
                end = chunk.end,
                "submitting chunk"
            );

            let job_id = match self.backend.submit(&chunk, &requests).await {
                Ok(job_id) => job_id,
                Err(source) => {
                    return self.finish(
                        run_id,
                        started_at,
                        total,
                        &collector,
                        RunOutcome::Failed {
                            completed_chunks,
                            error: RunError::Transport {
                                chunk: chunk.seq,
                                source,
                            },
                        },
                    );
                }
            };

            let verdict = match poller.wait_for_terminal(chunk.seq, &job_id, cancel).await {
                Ok(verdict) => verdict,
                Err(error) => {
                    return self.finish(
                        run_id,
                        started_at,
                        total,
                        &collector,
                        RunOutcome::Failed {
                            completed_chunks,
                            error,
                        },
                    );
                }
            };

            let batch = match verdict {
                PollVerdict::Terminal(batch) => batch,
                PollVerdict::Cancelled => {
                    return self.finish(
                        run_id,
                        started_at,
                        total,
                        &collector,
                        RunOutcome::Cancelled { completed_chunks },
                    );
                }
            };

            if !batch.status.is_success() {
                return self.finish(
                    run_id,
                    started_at,
                    total,
                    &collector,
                    RunOutcome::Failed {
                        completed_chunks,
                        error: RunError::JobFailed {
                            chunk: chunk.seq,
                            job: job_id,
                            status: batch.status,
                        },
                    },
                );
            }

            let results = match self.backend.fetch_results(&job_id).await {
                Ok(results) => results,
                Err(source) => {
                    return self.finish(
                        run_id,
                        started_at,
                        total,
                        &collector,
                        RunOutcome::Failed {
                            completed_chunks,
                            error: RunError::ResultFetch {
                                chunk: chunk.seq,
                                source,
                            },
                        },
                    );
                }
            };

            if let Err(error) = collector.merge(chunk.seq, results) {
                return self.finish(
                    run_id,
                    started_at,
                    total,
                    &collector,
                    RunOutcome::Failed {
                        completed_chunks,
                        error,
                    },
                );
            }

            completed_chunks += 1;
            info!(chunk = chunk.seq, collected = collector.len(), "chunk collected");
        }

        self.finish(run_id, started_at, total, &collector, RunOutcome::Completed)
    }

    fn finish(
        &self,
        run_id: Uuid,
        started_at: DateTime<Utc>,
        total: usize,
        collector: &ResultCollector,
        outcome: RunOutcome,
    ) -> RunReport {
        let output = collector.finalize(total);
        let missing = output.missing_count();

        match &outcome {
            RunOutcome::Completed => {
                info!(run = %run_id, filled = output.filled_count(), missing, "run completed");
            }
            RunOutcome::Cancelled { completed_chunks } => {
                warn!(run = %run_id, completed_chunks, missing, "run cancelled");
            }
            RunOutcome::Failed { completed_chunks, error } => {
                error!(run = %run_id, completed_chunks, missing, %error, "run failed");
            }
        }

        RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            total_items: total,
            output,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use alembic_client::error::{ClientError, Result as ClientResult};
    use alembic_core::domain::{BatchJob, Chunk, ChunkBound, JobId, JobStatus, RequestCounts, ResultMap};
    use alembic_core::dto::RequestRecord;

    use crate::config::RequestTemplate;

    struct TestItem(usize);

    impl PromptReady for TestItem {
        fn to_prompt_text(&self) -> String {
            format!("req-{}", self.0)
        }
    }

    fn dataset(n: usize) -> Dataset<TestItem> {
        Dataset::from_items((0..n).map(TestItem))
    }

    fn config(per_chunk: usize) -> RunConfig {
        RunConfig::new(
            ChunkBound::Items(per_chunk),
            RequestTemplate::new("teacher-xl", "label the state"),
        )
        .with_poll_interval(Duration::from_millis(1))
        .with_max_wait(Duration::from_millis(100))
    }

    /// Stub backend answering one result line `result-<i>` per item.
    ///
    /// Behavior knobs cover the failure scenarios: refusing a specific
    /// chunk's submission, reporting a failure status, duplicating ids,
    /// inventing unknown ids, and cancelling mid-run.
    #[derive(Default)]
    struct StubBackend {
        fail_submit_on: Option<usize>,
        report_status: Option<JobStatus>,
        duplicate_id: bool,
        extra_ids: bool,
        cancel_on_submit: Option<CancellationToken>,
        cancel_on_fetch: Option<CancellationToken>,
        submitted: Mutex<Vec<(Chunk, Vec<RequestRecord>)>>,
        pending: Mutex<HashMap<JobId, ResultMap>>,
    }

    impl StubBackend {
        fn submissions(&self) -> Vec<(Chunk, Vec<RequestRecord>)> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobBackend for StubBackend {
        async fn submit(&self, chunk: &Chunk, requests: &[RequestRecord]) -> ClientResult<JobId> {
            if self.fail_submit_on == Some(chunk.seq) {
                return Err(ClientError::api_error(500, "submission refused"));
            }

            if let Some(cancel) = &self.cancel_on_submit {
                cancel.cancel();
            }

            self.submitted
                .lock()
                .unwrap()
                .push((*chunk, requests.to_vec()));

            let mut results = ResultMap::new();
            for record in requests {
                let index = record.custom_id.index().unwrap();
                let id = if self.duplicate_id {
                    CustomId::from_index(0)
                } else {
                    record.custom_id.clone()
                };
                results.entry(id).or_default().push(format!("result-{index}"));
            }
            if self.extra_ids {
                results.insert(CustomId::from_index(999), vec!["stray".into()]);
                results.insert(
                    CustomId::from("state-1".to_string()),
                    vec!["foreign".into()],
                );
            }

            let job_id = JobId::new(format!("job-{}", chunk.seq));
            self.pending.lock().unwrap().insert(job_id.clone(), results);
            Ok(job_id)
        }

        async fn status(&self, job: &JobId) -> ClientResult<BatchJob> {
            Ok(BatchJob {
                id: job.clone(),
                status: self.report_status.unwrap_or(JobStatus::Completed),
                request_counts: RequestCounts::default(),
                output_file_id: None,
            })
        }

        async fn fetch_results(&self, job: &JobId) -> ClientResult<ResultMap> {
            if let Some(cancel) = &self.cancel_on_fetch {
                cancel.cancel();
            }

            self.pending
                .lock()
                .unwrap()
                .remove(job)
                .ok_or_else(|| ClientError::UnknownJob(job.clone()))
        }
    }

    fn lines(output: &OrderedOutput, index: usize) -> Option<Vec<String>> {
        output.get(index).map(|lines| lines.to_vec())
    }

    #[tokio::test]
    async fn full_run_reassembles_in_original_order() {
        let backend = Arc::new(StubBackend::default());
        let orchestrator = Orchestrator::new((backend.clone() as Arc<dyn JobBackend>), config(2));

        let report = orchestrator
            .run(&dataset(5), &CancellationToken::new())
            .await;

        assert!(report.outcome.is_success());
        assert_eq!(report.total_items, 5);
        assert_eq!(report.output.len(), 5);
        assert_eq!(report.output.missing_count(), 0);
        for i in 0..5 {
            assert_eq!(lines(&report.output, i), Some(vec![format!("result-{i}")]));
        }

        // Chunks [0,2), [2,4), [4,5) in order, each carrying the item's
        // prompt text as the user payload.
        let submissions = backend.submissions();
        let ranges: Vec<(usize, usize)> = submissions
            .iter()
            .map(|(chunk, _)| (chunk.start, chunk.end))
            .collect();
        assert_eq!(ranges, vec![(0, 2), (2, 4), (4, 5)]);
        assert_eq!(submissions[1].1[0].body.input[1].content, "req-2");
    }

    #[tokio::test]
    async fn empty_dataset_is_trivial_success() {
        let backend = Arc::new(StubBackend::default());
        let orchestrator = Orchestrator::new((backend.clone() as Arc<dyn JobBackend>), config(2));

        let report = orchestrator
            .run(&dataset(0), &CancellationToken::new())
            .await;

        assert!(report.outcome.is_success());
        assert!(report.output.is_empty());
        assert!(backend.submissions().is_empty());
    }

    #[tokio::test]
    async fn failed_middle_chunk_preserves_earlier_results() {
        let backend = Arc::new(StubBackend {
            fail_submit_on: Some(1),
            ..StubBackend::default()
        });
        let orchestrator = Orchestrator::new((backend.clone() as Arc<dyn JobBackend>), config(2));

        let report = orchestrator
            .run(&dataset(5), &CancellationToken::new())
            .await;

        match &report.outcome {
            RunOutcome::Failed {
                completed_chunks,
                error: RunError::Transport { chunk, .. },
            } => {
                assert_eq!(*completed_chunks, 1);
                assert_eq!(*chunk, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        // Chunk 0 collected; chunks 1 and 2 never produced results.
        assert_eq!(lines(&report.output, 0), Some(vec!["result-0".to_string()]));
        assert_eq!(lines(&report.output, 1), Some(vec!["result-1".to_string()]));
        assert_eq!(report.output.get(2), None);
        assert_eq!(report.output.get(3), None);
        assert_eq!(report.output.get(4), None);
        assert_eq!(report.output.missing_count(), 3);

        // The failing chunk aborted the run: chunk 2 was never submitted.
        assert_eq!(backend.submissions().len(), 1);
    }

    #[tokio::test]
    async fn failure_status_aborts_with_job_failed() {
        let backend = Arc::new(StubBackend {
            report_status: Some(JobStatus::Expired),
            ..StubBackend::default()
        });
        let orchestrator = Orchestrator::new((backend.clone() as Arc<dyn JobBackend>), config(2));

        let report = orchestrator
            .run(&dataset(3), &CancellationToken::new())
            .await;

        match &report.outcome {
            RunOutcome::Failed {
                error: RunError::JobFailed { chunk, status, .. },
                ..
            } => {
                assert_eq!(*chunk, 0);
                assert_eq!(*status, JobStatus::Expired);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(report.output.missing_count(), 3);
    }

    #[tokio::test]
    async fn duplicate_ids_across_chunks_abort_the_run() {
        let backend = Arc::new(StubBackend {
            duplicate_id: true,
            ..StubBackend::default()
        });
        let orchestrator = Orchestrator::new((backend.clone() as Arc<dyn JobBackend>), config(1));

        let report = orchestrator
            .run(&dataset(2), &CancellationToken::new())
            .await;

        match &report.outcome {
            RunOutcome::Failed {
                error: RunError::DuplicateResult { chunk, custom_id },
                ..
            } => {
                assert_eq!(*chunk, 1);
                assert_eq!(custom_id.index(), Some(0));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_result_ids_are_ignored() {
        let backend = Arc::new(StubBackend {
            extra_ids: true,
            ..StubBackend::default()
        });
        let orchestrator = Orchestrator::new((backend.clone() as Arc<dyn JobBackend>), config(4));

        let report = orchestrator
            .run(&dataset(3), &CancellationToken::new())
            .await;

        assert!(report.outcome.is_success());
        assert_eq!(report.output.len(), 3);
        assert_eq!(report.output.missing_count(), 0);
    }

    #[tokio::test]
    async fn invalid_configuration_fails_before_any_submission() {
        let backend = Arc::new(StubBackend::default());
        let orchestrator = Orchestrator::new((backend.clone() as Arc<dyn JobBackend>), config(0));

        let report = orchestrator
            .run(&dataset(4), &CancellationToken::new())
            .await;

        match &report.outcome {
            RunOutcome::Failed { completed_chunks, error } => {
                assert_eq!(*completed_chunks, 0);
                assert!(matches!(error, RunError::InvalidConfiguration(_)));
                assert!(error.chunk().is_none());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(report.output.len(), 4);
        assert_eq!(report.output.missing_count(), 4);
        assert!(backend.submissions().is_empty());
    }

    #[tokio::test]
    async fn cancellation_mid_poll_abandons_inflight_chunk() {
        let cancel = CancellationToken::new();
        let backend = Arc::new(StubBackend {
            cancel_on_submit: Some(cancel.clone()),
            ..StubBackend::default()
        });
        let orchestrator = Orchestrator::new((backend.clone() as Arc<dyn JobBackend>), config(2));

        let report = orchestrator.run(&dataset(5), &cancel).await;

        // The cancel arrived between submission and the first poll tick,
        // so chunk 0 was abandoned without being collected.
        match &report.outcome {
            RunOutcome::Cancelled { completed_chunks } => assert_eq!(*completed_chunks, 0),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(report.output.missing_count(), 5);
        assert_eq!(backend.submissions().len(), 1);
    }

    #[tokio::test]
    async fn cancellation_at_chunk_boundary_keeps_collected_chunks() {
        let cancel = CancellationToken::new();
        let backend = Arc::new(StubBackend {
            cancel_on_fetch: Some(cancel.clone()),
            ..StubBackend::default()
        });
        let orchestrator = Orchestrator::new((backend.clone() as Arc<dyn JobBackend>), config(2));

        let report = orchestrator.run(&dataset(5), &cancel).await;

        // Chunk 0's results were already in hand when the cancel arrived,
        // so it still counts as collected; the boundary check stops chunk 1.
        match &report.outcome {
            RunOutcome::Cancelled { completed_chunks } => assert_eq!(*completed_chunks, 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(lines(&report.output, 0), Some(vec!["result-0".to_string()]));
        assert_eq!(lines(&report.output, 1), Some(vec!["result-1".to_string()]));
        assert_eq!(report.output.missing_count(), 3);
        assert_eq!(backend.submissions().len(), 1);
    }

    #[tokio::test]
    async fn pre_cancelled_run_submits_nothing() {
        let backend = Arc::new(StubBackend::default());
        let orchestrator = Orchestrator::new((backend.clone() as Arc<dyn JobBackend>), config(2));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = orchestrator.run(&dataset(4), &cancel).await;

        match &report.outcome {
            RunOutcome::Cancelled { completed_chunks } => assert_eq!(*completed_chunks, 0),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(report.output.missing_count(), 4);
        assert!(backend.submissions().is_empty());
    }
}
