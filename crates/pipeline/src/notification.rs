//! Result delivery over Telegram.
//!
//! Delivery is best effort and runs after the job's terminal
//! transition is already durable: a send failure never reopens the job.
//! Every send attempt, successful or not, is recorded in the
//! `notifications` table for operators.

use sqlx::PgPool;

use pixora_core::delivery::{delivery_caption, plan_batches, DeliveryBatch};
use pixora_core::error::CoreError;
use pixora_db::models::job::Job;
use pixora_db::models::notification::{KIND_MEDIA_GROUP, KIND_MESSAGE, KIND_PHOTO};
use pixora_db::repositories::{AvatarRepo, NotificationRepo, PhotoRepo, UserRepo};
use pixora_telegram::BotApi;

use crate::config::PipelineConfig;
use crate::error::PipelineResult;

/// Tally of one delivery pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub batches_sent: usize,
    pub batches_failed: usize,
}

/// Sends generation results and failure notices to the job's user.
pub struct Notifier {
    pool: PgPool,
    bot: BotApi,
}

impl Notifier {
    pub fn new(pool: PgPool, config: &PipelineConfig) -> Self {
        Self::with_bot(pool, BotApi::new(&config.telegram_bot_token))
    }

    /// Build against a caller-supplied bot client (non-default API host).
    pub fn with_bot(pool: PgPool, bot: BotApi) -> Self {
        Self { pool, bot }
    }

    /// Deliver a completed job's photos, batched to the transport's
    /// media-group limit, with the caption on the first batch.
    ///
    /// Individual batch failures are recorded and counted, not
    /// propagated; later batches still go out.
    pub async fn deliver_job_results(&self, job: &Job) -> PipelineResult<DeliveryReport> {
        let chat_id = self.chat_for_job(job).await?;
        let photos =
            PhotoRepo::list_for_avatar_style(&self.pool, job.avatar_id, job.style_id).await?;
        let urls: Vec<String> = photos.into_iter().map(|p| p.url).collect();
        if urls.is_empty() {
            tracing::warn!(job_id = job.id, "Completed job has no photos to deliver");
            return Ok(DeliveryReport::default());
        }

        let caption = delivery_caption(urls.len());
        let mut report = DeliveryReport::default();
        for (index, batch) in plan_batches(&urls).iter().enumerate() {
            let caption = (index == 0).then_some(caption.as_str());
            let (kind, payload, result) = match batch {
                DeliveryBatch::Single(url) => (
                    KIND_PHOTO,
                    serde_json::json!({ "photo": url, "caption": caption }),
                    self.bot.send_photo(chat_id, url, caption).await,
                ),
                DeliveryBatch::Group(items) => (
                    KIND_MEDIA_GROUP,
                    serde_json::json!({ "media": items, "caption": caption }),
                    self.bot.send_media_group(chat_id, items, caption).await,
                ),
            };

            let is_sent = match result {
                Ok(()) => {
                    report.batches_sent += 1;
                    true
                }
                Err(e) => {
                    tracing::warn!(job_id = job.id, chat_id, error = %e, "Batch delivery failed");
                    report.batches_failed += 1;
                    false
                }
            };
            NotificationRepo::record(&self.pool, chat_id, kind, &payload, is_sent).await?;
        }

        tracing::info!(
            job_id = job.id,
            chat_id,
            sent = report.batches_sent,
            failed = report.batches_failed,
            "Delivery pass finished",
        );
        Ok(report)
    }

    /// Send a plain text failure notice for a failed job.
    pub async fn notify_failure(&self, job: &Job, text: &str) -> PipelineResult<()> {
        let chat_id = self.chat_for_job(job).await?;
        let is_sent = match self.bot.send_message(chat_id, text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(job_id = job.id, chat_id, error = %e, "Failure notice not delivered");
                false
            }
        };
        NotificationRepo::record(
            &self.pool,
            chat_id,
            KIND_MESSAGE,
            &serde_json::json!({ "text": text }),
            is_sent,
        )
        .await?;
        Ok(())
    }

    /// Resolve the Telegram chat behind a job via its avatar's owner.
    async fn chat_for_job(&self, job: &Job) -> PipelineResult<i64> {
        let avatar = AvatarRepo::find_by_id(&self.pool, job.avatar_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "avatar",
                id: job.avatar_id,
            })?;
        let user = UserRepo::find_by_id(&self.pool, avatar.user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "user",
                id: avatar.user_id,
            })?;
        Ok(user.chat_id)
    }
}
