//! Refund compensation for failed jobs.
//!
//! Invoked only by the aggregator pass that won the `processing` to
//! `failed` transition, so at most one refund attempt runs per job
//! failure. The local `succeeded` to `refunded` flip adds a second
//! guard for jobs that are retried and fail again: a payment already
//! refunded is never sent to the processor a second time.

use sqlx::PgPool;

use pixora_core::error::CoreError;
use pixora_core::types::DbId;
use pixora_db::models::job::Job;
use pixora_db::models::payment::Payment;
use pixora_db::models::status::PaymentStatus;
use pixora_db::repositories::{AvatarRepo, PaymentRepo};
use pixora_payments::PaymentGateway;

use crate::config::PipelineConfig;
use crate::error::PipelineResult;

/// What compensation did for a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundOutcome {
    /// The processor accepted the refund and the payment was flipped.
    Refunded { payment_id: DbId },
    /// The payment was already refunded; nothing was sent.
    AlreadyRefunded,
    /// No refundable payment could be located for the job's user.
    NoPaymentFound,
}

/// Issues at-most-once refunds for failed jobs.
pub struct RefundEngine {
    pool: PgPool,
    gateway: PaymentGateway,
}

impl RefundEngine {
    pub fn new(pool: PgPool, config: &PipelineConfig) -> Self {
        let gateway = PaymentGateway::new(
            config.payment_api_url.clone(),
            config.payment_api_key.clone(),
        );
        Self { pool, gateway }
    }

    /// Refund the payment behind a failed job.
    ///
    /// Resolution order: the payment linked at admission, else the
    /// user's most recent succeeded payment. A job with no refundable
    /// payment is logged for reconciliation, not treated as an error.
    /// A processor error propagates with the payment still `succeeded`,
    /// so a later invocation can try again.
    pub async fn refund_for_job(&self, job: &Job) -> PipelineResult<RefundOutcome> {
        let payment = self.resolve_payment(job).await?;
        let Some(payment) = payment else {
            tracing::error!(
                job_id = job.id,
                avatar_id = job.avatar_id,
                "No refundable payment found for failed job",
            );
            return Ok(RefundOutcome::NoPaymentFound);
        };

        if payment.status_id == PaymentStatus::Refunded.id() {
            tracing::info!(
                job_id = job.id,
                payment_id = payment.id,
                "Payment already refunded, skipping",
            );
            return Ok(RefundOutcome::AlreadyRefunded);
        }

        self.gateway
            .refund(
                &payment.provider_payment_id,
                payment.amount_minor,
                &payment.currency,
            )
            .await?;

        if !PaymentRepo::mark_refunded(&self.pool, payment.id).await? {
            // Lost the local flip to a concurrent refund of the same
            // payment. The processor call above was still singular for
            // this job failure; record and move on.
            tracing::warn!(
                job_id = job.id,
                payment_id = payment.id,
                "Payment flipped to refunded concurrently",
            );
            return Ok(RefundOutcome::AlreadyRefunded);
        }

        tracing::info!(
            job_id = job.id,
            payment_id = payment.id,
            amount_minor = payment.amount_minor,
            "Payment refunded",
        );
        Ok(RefundOutcome::Refunded {
            payment_id: payment.id,
        })
    }

    /// The payment to refund: direct link first, newest succeeded
    /// payment of the avatar's owner as fallback.
    async fn resolve_payment(&self, job: &Job) -> PipelineResult<Option<Payment>> {
        if let Some(payment_id) = job.payment_id {
            return Ok(PaymentRepo::find_by_id(&self.pool, payment_id).await?);
        }
        let avatar = AvatarRepo::find_by_id(&self.pool, job.avatar_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "avatar",
                id: job.avatar_id,
            })?;
        Ok(PaymentRepo::latest_succeeded_for_user(&self.pool, avatar.user_id).await?)
    }
}
