//! Payment entity model (referenced by the pipeline, owned by checkout).

use pixora_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub user_id: DbId,
    /// Identifier at the payment processor; refunds are issued against it.
    pub provider_payment_id: String,
    /// Amount in minor currency units (cents, kopecks).
    pub amount_minor: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
