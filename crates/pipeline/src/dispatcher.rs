//! Job admission and submission fan-out.
//!
//! Admission validates synchronously and persists the job in `pending`;
//! anything wrong with the request is a client error and leaves no
//! state behind. Submission then runs asynchronously, either as chunk
//! callbacks from the durable queue or as a detached inline
//! continuation, and both paths converge on identical task rows.
//!
//! A failed engine submission for one unit is NOT a dispatcher failure:
//! it becomes a `failed` task and the aggregator decides what it means
//! for the job. Units are not resubmitted after a submission failure;
//! the policy matches a failed status check.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use sqlx::PgPool;

use pixora_core::error::CoreError;
use pixora_core::prompt::{build_prompts, clamp_unit_count, validate_reference_images};
use pixora_core::types::DbId;
use pixora_db::models::job::{CreateJob, Job};
use pixora_db::models::status::{AvatarStatus, JobStatus, PaymentStatus};
use pixora_db::repositories::{AvatarRepo, JobRepo, PaymentRepo, StyleRepo, TaskRepo};
use pixora_engine::EngineApi;

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::queue::{chunk_ranges, ChunkMessage, QueueClient};

/// A validated generation request from the checkout flow.
#[derive(Debug, serde::Deserialize)]
pub struct AdmissionRequest {
    pub avatar_id: DbId,
    pub style_id: DbId,
    pub payment_id: Option<DbId>,
    pub requested_count: u32,
}

/// Admits jobs and fans their units out to the generation engine.
#[derive(Clone)]
pub struct Dispatcher {
    pool: PgPool,
    engine: Arc<EngineApi>,
    queue: Option<Arc<QueueClient>>,
    config: Arc<PipelineConfig>,
}

impl Dispatcher {
    /// Build a dispatcher from configuration. Constructs its own
    /// engine and queue clients; configuration is per-invocation.
    pub fn new(pool: PgPool, config: Arc<PipelineConfig>) -> Self {
        let engine = Arc::new(EngineApi::new(
            config.engine_api_url.clone(),
            config.engine_api_key.clone(),
        ));
        let queue = config
            .queue
            .clone()
            .map(|qc| Arc::new(QueueClient::new(qc)));
        Self {
            pool,
            engine,
            queue,
            config,
        }
    }

    /// Admit a generation request: validate, clamp, persist the job in
    /// `pending`, and mark the avatar as generating.
    ///
    /// All validation failures here are client errors; no job row is
    /// created and nothing is submitted.
    pub async fn admit(&self, req: &AdmissionRequest) -> PipelineResult<Job> {
        let avatar = AvatarRepo::find_by_id(&self.pool, req.avatar_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "avatar",
                id: req.avatar_id,
            })?;
        validate_reference_images(&avatar.reference_urls())?;

        let style = StyleRepo::find_by_id(&self.pool, req.style_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "style",
                id: req.style_id,
            })?;
        let templates = StyleRepo::list_prompts(&self.pool, style.id).await?;

        let unit_count = clamp_unit_count(
            req.requested_count,
            self.config.max_units_per_job,
            templates.len(),
        )?;

        if let Some(payment_id) = req.payment_id {
            let payment = PaymentRepo::find_by_id(&self.pool, payment_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "payment",
                    id: payment_id,
                })?;
            if payment.user_id != avatar.user_id {
                return Err(CoreError::Validation(
                    "Payment does not belong to the avatar's owner".to_string(),
                )
                .into());
            }
            if payment.status_id != PaymentStatus::Succeeded.id() {
                return Err(CoreError::Validation(
                    "Payment has not succeeded".to_string(),
                )
                .into());
            }
        }

        let job = JobRepo::create(
            &self.pool,
            &CreateJob {
                avatar_id: avatar.id,
                style_id: style.id,
                payment_id: req.payment_id,
                requested_count: unit_count as i32,
            },
        )
        .await?;
        AvatarRepo::set_status(&self.pool, avatar.id, AvatarStatus::Generating).await?;

        tracing::info!(
            job_id = job.id,
            avatar_id = avatar.id,
            style_id = style.id,
            requested_count = job.requested_count,
            "Job admitted",
        );
        Ok(job)
    }

    /// Kick off submission for an admitted job.
    ///
    /// With a queue configured, publishes one message per chunk; the
    /// queue calls back into [`Self::run_chunk`]. Without one, spawns a
    /// detached continuation running [`Self::run_submission`]. A queue
    /// publish failure before anything was submitted is an
    /// unrecoverable dispatcher-side error and fails the job.
    pub async fn dispatch(&self, job: &Job) -> PipelineResult<()> {
        match &self.queue {
            Some(queue) => {
                for (start, count) in
                    chunk_ranges(job.requested_count as u32, self.config.chunk_size)
                {
                    let msg = ChunkMessage {
                        job_id: job.id,
                        start,
                        count,
                    };
                    if let Err(e) = queue.enqueue_chunk(&msg).await {
                        tracing::error!(job_id = job.id, start, error = %e, "Queue publish failed");
                        JobRepo::fail_pending(&self.pool, job.id, "Failed to enqueue dispatch")
                            .await?;
                        return Err(e.into());
                    }
                }
                tracing::info!(job_id = job.id, "Dispatch chunks enqueued");
            }
            None => {
                let this = self.clone();
                let job_id = job.id;
                tokio::spawn(async move {
                    if let Err(e) = this.run_submission(job_id).await {
                        tracing::error!(job_id, error = %e, "Inline submission failed");
                    }
                });
            }
        }
        Ok(())
    }

    /// Whole-job submission path: the inline continuation.
    ///
    /// Takes the admission lock first. A contender that loses the
    /// `pending` to `processing` race exits without side effects; this
    /// is what makes duplicate triggers harmless.
    pub async fn run_submission(&self, job_id: DbId) -> PipelineResult<()> {
        if !JobRepo::try_start(&self.pool, job_id).await? {
            tracing::info!(job_id, "Job already started elsewhere, nothing to do");
            return Ok(());
        }
        let (job, prompts, reference_urls) = self.load_submission(job_id).await?;
        self.submit_range(&job, &prompts, &reference_urls, 0, prompts.len())
            .await;
        Ok(())
    }

    /// Chunk submission path: the durable-queue callback.
    ///
    /// The first chunk to arrive takes the admission lock; later chunks
    /// find the job already `processing` and proceed. A chunk for a
    /// terminal job (stale redelivery after timeout-failure) is
    /// ignored. Redelivered chunks of an active job are neutralized by
    /// the per-ordinal existence check.
    pub async fn run_chunk(&self, msg: &ChunkMessage) -> PipelineResult<()> {
        let started = JobRepo::try_start(&self.pool, msg.job_id).await?;
        if !started {
            let job = JobRepo::find_by_id(&self.pool, msg.job_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "job",
                    id: msg.job_id,
                })?;
            if job.status_id != JobStatus::Processing.id() {
                tracing::info!(job_id = msg.job_id, "Chunk for inactive job ignored");
                return Ok(());
            }
        }

        let (job, prompts, reference_urls) = self.load_submission(msg.job_id).await?;
        let start = msg.start.max(0) as usize;
        let end = start
            .saturating_add(msg.count.max(0) as usize)
            .min(prompts.len());
        self.submit_range(&job, &prompts, &reference_urls, start, end)
            .await;
        Ok(())
    }

    /// Admin retry: reset a terminal job to `pending`, wipe its old
    /// tasks, and re-run the submission path for the same job id.
    pub async fn retry(&self, job_id: DbId) -> PipelineResult<Job> {
        let job = JobRepo::find_by_id(&self.pool, job_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "job",
                id: job_id,
            })?;

        if !JobRepo::reset_for_retry(&self.pool, job_id).await? {
            return Err(CoreError::Conflict(
                "Only a completed, failed, or cancelled job can be retried".to_string(),
            )
            .into());
        }
        let wiped = TaskRepo::delete_for_job(&self.pool, job_id).await?;
        AvatarRepo::set_status(&self.pool, job.avatar_id, AvatarStatus::Generating).await?;
        tracing::info!(job_id, wiped_tasks = wiped, "Job reset for retry");

        let job = JobRepo::find_by_id(&self.pool, job_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "job",
                id: job_id,
            })?;
        self.dispatch(&job).await?;
        Ok(job)
    }

    // ---- private helpers ----

    /// Load everything a submission pass needs: the job, its ordered
    /// per-unit prompts, and the avatar's reference image URLs.
    async fn load_submission(
        &self,
        job_id: DbId,
    ) -> PipelineResult<(Job, Vec<String>, Vec<String>)> {
        let job = JobRepo::find_by_id(&self.pool, job_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "job",
                id: job_id,
            })?;
        let avatar = AvatarRepo::find_by_id(&self.pool, job.avatar_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "avatar",
                id: job.avatar_id,
            })?;
        let style = StyleRepo::find_by_id(&self.pool, job.style_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "style",
                id: job.style_id,
            })?;
        let templates = StyleRepo::list_prompts(&self.pool, style.id).await?;
        let prompts = build_prompts(
            &style.prompt_prefix,
            &style.prompt_suffix,
            &templates,
            job.requested_count as u32,
        );
        Ok((job, prompts, avatar.reference_urls()))
    }

    /// Submit units `start..end` with bounded concurrency so one job's
    /// fan-out neither serializes nor floods the engine.
    async fn submit_range(
        &self,
        job: &Job,
        prompts: &[String],
        reference_urls: &[String],
        start: usize,
        end: usize,
    ) {
        stream::iter(start..end)
            .for_each_concurrent(self.config.submit_concurrency, |ordinal| {
                let prompt = &prompts[ordinal];
                async move {
                    self.submit_unit(job, ordinal as i32, prompt, reference_urls)
                        .await;
                }
            })
            .await;
    }

    /// Submit one unit. Errors are absorbed here: an engine failure
    /// yields a `failed` task for the aggregator to judge, and a
    /// database failure is logged and retried by the next trigger.
    async fn submit_unit(&self, job: &Job, ordinal: i32, prompt: &str, reference_urls: &[String]) {
        match TaskRepo::exists(&self.pool, job.id, ordinal).await {
            Ok(true) => {
                tracing::debug!(job_id = job.id, ordinal, "Task already exists, skipping");
                return;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(job_id = job.id, ordinal, error = %e, "Task existence check failed");
                return;
            }
        }

        match self.engine.submit(prompt, reference_urls).await {
            Ok(resp) => {
                if let Err(e) =
                    TaskRepo::create_if_absent(&self.pool, job.id, ordinal, prompt, &resp.task_id)
                        .await
                {
                    tracing::error!(job_id = job.id, ordinal, error = %e, "Failed to persist task");
                }
            }
            Err(e) => {
                tracing::warn!(
                    job_id = job.id,
                    ordinal,
                    error = %e,
                    "Engine submission failed, recording failed task",
                );
                if let Err(e) = TaskRepo::create_failed_if_absent(
                    &self.pool,
                    job.id,
                    ordinal,
                    prompt,
                    &format!("submission failed: {e}"),
                )
                .await
                {
                    tracing::error!(job_id = job.id, ordinal, error = %e, "Failed to persist failed task");
                }
            }
        }
    }
}
