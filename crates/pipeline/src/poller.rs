//! Scheduled polling of pending tasks against the engine.
//!
//! One cycle inspects a bounded, oldest-first batch of pending tasks
//! under a wall-clock budget, ingests each engine answer, then sweeps
//! all `processing` jobs through the aggregator. Cycles are memoryless:
//! anything not reached this time is at the front of the next batch.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use pixora_core::error::CoreError;
use pixora_core::outcome::failure_message;
use pixora_core::polling::{is_expired, TIMEOUT_REASON};
use pixora_db::models::job::Job;
use pixora_db::models::status::AvatarStatus;
use pixora_db::models::task::Task;
use pixora_db::repositories::{AvatarRepo, JobRepo, PhotoRepo, TaskRepo};
use pixora_engine::{EngineApi, GenerationStatus};
use pixora_storage::{photo_key, ImageStore};

use crate::aggregator::{Aggregator, Resolution};
use crate::compensation::{RefundEngine, RefundOutcome};
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::notification::Notifier;

/// What ingesting one engine answer did to the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Photo persisted and task marked completed.
    Completed,
    /// Engine reported failure; task marked failed.
    Failed,
    /// Still pending and within the wait ceiling; attempts bumped.
    Deferred,
    /// Still pending but past the wait ceiling; task forced to failed.
    TimedOut,
}

/// Tally of one poll cycle, for the trigger's response and logs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CycleReport {
    /// Tasks actually inspected before the budget ran out.
    pub inspected: usize,
    pub completed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub deferred: usize,
    /// Whether the cycle stopped on budget rather than batch end.
    pub budget_exhausted: bool,
    /// Jobs this cycle moved to a terminal status.
    pub jobs_closed: usize,
}

/// Drives poll cycles: task ingestion plus the aggregator sweep.
pub struct TaskPoller {
    pool: PgPool,
    engine: Arc<EngineApi>,
    store: Option<Arc<ImageStore>>,
    config: Arc<PipelineConfig>,
    aggregator: Aggregator,
    notifier: Notifier,
    refunds: RefundEngine,
}

impl TaskPoller {
    pub fn new(pool: PgPool, config: Arc<PipelineConfig>) -> Self {
        let engine = Arc::new(EngineApi::new(
            config.engine_api_url.clone(),
            config.engine_api_key.clone(),
        ));
        let store = config
            .storage_api_url
            .clone()
            .map(|url| Arc::new(ImageStore::new(url, config.storage_api_key.clone())));
        let aggregator = Aggregator::new(pool.clone());
        let notifier = Notifier::new(pool.clone(), &config);
        let refunds = RefundEngine::new(pool.clone(), &config);
        Self {
            pool,
            engine,
            store,
            config,
            aggregator,
            notifier,
            refunds,
        }
    }

    /// Swap in a notifier bound to a non-default bot client.
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Run one poll cycle.
    pub async fn run_cycle(&self) -> PipelineResult<CycleReport> {
        let started = tokio::time::Instant::now();
        let mut report = CycleReport::default();

        let batch =
            TaskRepo::list_pending_batch(&self.pool, self.config.poll_batch_size).await?;
        for task in &batch {
            if started.elapsed() >= self.config.poll_budget {
                report.budget_exhausted = true;
                tracing::info!(
                    inspected = report.inspected,
                    batch = batch.len(),
                    "Poll budget exhausted, deferring rest of batch",
                );
                break;
            }
            report.inspected += 1;
            match self.poll_task(task).await {
                Some(IngestOutcome::Completed) => report.completed += 1,
                Some(IngestOutcome::Failed) => report.failed += 1,
                Some(IngestOutcome::TimedOut) => report.timed_out += 1,
                Some(IngestOutcome::Deferred) | None => report.deferred += 1,
            }
        }

        // Sweep every in-flight job, not just those touched above: a
        // job whose last task resolved in an earlier cycle still needs
        // closing here.
        for job in JobRepo::list_processing(&self.pool).await? {
            match self.aggregator.evaluate_job(&job).await {
                Ok(Some(resolution)) => {
                    report.jobs_closed += 1;
                    self.finish_job(&job, resolution).await;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(job_id = job.id, error = %e, "Aggregation failed for job");
                }
            }
        }

        tracing::info!(
            inspected = report.inspected,
            completed = report.completed,
            failed = report.failed,
            timed_out = report.timed_out,
            jobs_closed = report.jobs_closed,
            "Poll cycle finished",
        );
        Ok(report)
    }

    /// Check one task against the engine and ingest the answer.
    ///
    /// A transport or engine-API error leaves the task untouched for
    /// the next cycle; it is not evidence the generation failed.
    async fn poll_task(&self, task: &Task) -> Option<IngestOutcome> {
        let Some(engine_task_id) = task.engine_task_id.as_deref() else {
            tracing::error!(task_id = task.id, "Pending task has no engine handle");
            return None;
        };
        let status = match self.engine.check_status(engine_task_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(task_id = task.id, error = %e, "Status check failed, will retry");
                return None;
            }
        };
        match ingest(
            &self.pool,
            self.store.as_deref(),
            task,
            status,
            Utc::now(),
            self.config.task_max_wait_secs,
        )
        .await
        {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(task_id = task.id, error = %e, "Ingest failed");
                None
            }
        }
    }

    /// Fire the downstream effects owned by a won terminal transition.
    /// Effects are best effort; their errors are logged, never bubbled,
    /// because the job's terminal status is already durable.
    async fn finish_job(&self, job: &Job, resolution: Resolution) {
        match resolution {
            Resolution::Completed { .. } => {
                if let Err(e) =
                    AvatarRepo::set_status(&self.pool, job.avatar_id, AvatarStatus::Completed)
                        .await
                {
                    tracing::error!(job_id = job.id, error = %e, "Avatar status update failed");
                }
                if let Err(e) = self.notifier.deliver_job_results(job).await {
                    tracing::error!(job_id = job.id, error = %e, "Result delivery failed");
                }
            }
            Resolution::Failed { failed, total } => {
                // Free the avatar for another attempt; conditional so a
                // concurrent flow that advanced it is not clobbered.
                if let Err(e) = AvatarRepo::transition_status(
                    &self.pool,
                    job.avatar_id,
                    AvatarStatus::Generating,
                    AvatarStatus::Ready,
                )
                .await
                {
                    tracing::error!(job_id = job.id, error = %e, "Avatar revert failed");
                }

                let refund_line = match self.refunds.refund_for_job(job).await {
                    Ok(RefundOutcome::Refunded { .. }) | Ok(RefundOutcome::AlreadyRefunded) => {
                        " Your payment has been refunded."
                    }
                    Ok(RefundOutcome::NoPaymentFound) => "",
                    Err(e) => {
                        tracing::error!(job_id = job.id, error = %e, "Refund failed");
                        ""
                    }
                };
                let text = format!(
                    "Generation failed: {}.{refund_line}",
                    failure_message(failed, total)
                );
                if let Err(e) = self.notifier.notify_failure(job, &text).await {
                    tracing::error!(job_id = job.id, error = %e, "Failure notice failed");
                }
            }
        }
    }
}

/// Apply one engine answer to a pending task.
///
/// On completion the photo is persisted strictly before the task is
/// marked completed, with an existence check in between, so a crash or
/// race between the two steps re-runs harmlessly. On a still-pending
/// answer the task's age is checked against the wait ceiling and the
/// task is forced to failed once it is exceeded.
pub async fn ingest(
    pool: &PgPool,
    store: Option<&ImageStore>,
    task: &Task,
    status: GenerationStatus,
    now: pixora_core::types::Timestamp,
    max_wait_secs: u64,
) -> PipelineResult<IngestOutcome> {
    match status {
        GenerationStatus::Completed { url } => {
            let job = JobRepo::find_by_id(pool, task.job_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "job",
                    id: task.job_id,
                })?;

            let final_url = rehost(store, &job, task, url).await;
            if PhotoRepo::exists(pool, job.avatar_id, job.style_id, &task.prompt).await? {
                tracing::debug!(task_id = task.id, "Photo already persisted, skipping insert");
            } else {
                PhotoRepo::create(pool, job.avatar_id, job.style_id, &task.prompt, &final_url)
                    .await?;
            }
            if !TaskRepo::mark_completed(pool, task.id, &final_url).await? {
                tracing::debug!(task_id = task.id, "Task already left pending");
            }
            Ok(IngestOutcome::Completed)
        }
        GenerationStatus::Failed { reason } => {
            if !TaskRepo::mark_failed(pool, task.id, &reason).await? {
                tracing::debug!(task_id = task.id, "Task already left pending");
            }
            Ok(IngestOutcome::Failed)
        }
        GenerationStatus::Pending => {
            TaskRepo::bump_attempts(pool, task.id).await?;
            if is_expired(task.created_at, now, max_wait_secs) {
                if TaskRepo::mark_failed(pool, task.id, TIMEOUT_REASON).await? {
                    tracing::warn!(
                        task_id = task.id,
                        job_id = task.job_id,
                        attempts = task.attempts + 1,
                        "Task exceeded maximum wait, forcing failure",
                    );
                }
                Ok(IngestOutcome::TimedOut)
            } else {
                Ok(IngestOutcome::Deferred)
            }
        }
    }
}

/// Re-host an engine result at a stable URL, falling back to the
/// engine-provided URL when storage is unconfigured or the upload
/// fails. Engine URLs expire eventually, so the fallback is logged.
async fn rehost(store: Option<&ImageStore>, job: &Job, task: &Task, url: String) -> String {
    let Some(store) = store else {
        return url;
    };
    let key = photo_key(job.avatar_id, job.style_id, task.ordinal);
    match store.upload_from_url(&url, &key).await {
        Ok(public_url) => public_url,
        Err(e) => {
            tracing::warn!(task_id = task.id, error = %e, "Re-hosting failed, keeping engine URL");
            url
        }
    }
}
