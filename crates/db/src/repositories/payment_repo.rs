//! Repository for the `payments` table.
//!
//! The pipeline only reads payments and flips `succeeded` to
//! `refunded`; creation belongs to the checkout flow.

use sqlx::PgPool;

use pixora_core::types::DbId;

use crate::models::payment::Payment;
use crate::models::status::PaymentStatus;

/// Column list for `payments` queries.
const COLUMNS: &str = "\
    id, user_id, provider_payment_id, amount_minor, currency, \
    status_id, created_at, updated_at";

/// Provides lookups and the refund transition for payments.
pub struct PaymentRepo;

impl PaymentRepo {
    /// Record a payment (checkout side; used by tests and fixtures).
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        provider_payment_id: &str,
        amount_minor: i64,
        currency: &str,
        status: PaymentStatus,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments \
                 (user_id, provider_payment_id, amount_minor, currency, status_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(user_id)
            .bind(provider_payment_id)
            .bind(amount_minor)
            .bind(currency)
            .bind(status.id())
            .fetch_one(pool)
            .await
    }

    /// Find a payment by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The most recent succeeded payment for a user. Fallback used by
    /// compensation when a job has no direct payment link.
    pub async fn latest_succeeded_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments \
             WHERE user_id = $1 AND status_id = $2 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(user_id)
            .bind(PaymentStatus::Succeeded.id())
            .fetch_optional(pool)
            .await
    }

    /// Transition a payment from `succeeded` to `refunded`.
    ///
    /// Returns `true` only for the caller that performed the
    /// transition. A payment already refunded locally stays refunded;
    /// this is the local half of the refund-at-most-once guarantee.
    pub async fn mark_refunded(pool: &PgPool, payment_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payments \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(payment_id)
        .bind(PaymentStatus::Refunded.id())
        .bind(PaymentStatus::Succeeded.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
