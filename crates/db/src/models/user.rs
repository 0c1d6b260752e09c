//! User entity model.

use pixora_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    /// Messaging chat id used for notification delivery.
    pub chat_id: i64,
    pub created_at: Timestamp,
}
