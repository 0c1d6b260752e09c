//! Repository for the `notifications` table.
//!
//! Rows are written once, at send time, with the attempt's outcome.
//! There is no retry machinery here by design: failed deliveries are
//! surfaced for operators, not re-driven.

use sqlx::PgPool;

use pixora_core::types::DbId;

use crate::models::notification::Notification;

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, chat_id, kind, payload, is_sent, attempts, created_at";

/// Records delivery attempts for audit and operational visibility.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Record a delivery attempt and its outcome, returning the row ID.
    pub async fn record(
        pool: &PgPool,
        chat_id: i64,
        kind: &str,
        payload: &serde_json::Value,
        is_sent: bool,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications (chat_id, kind, payload, is_sent) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(chat_id)
        .bind(kind)
        .bind(payload)
        .bind(is_sent)
        .fetch_one(pool)
        .await
    }

    /// Most recent delivery attempts, newest first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             ORDER BY created_at DESC \
             LIMIT $1"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
