//! Notification message entity model.

use pixora_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Message kind: a single photo sent via `sendPhoto`.
pub const KIND_PHOTO: &str = "photo";
/// Message kind: a batch sent via `sendMediaGroup`.
pub const KIND_MEDIA_GROUP: &str = "media_group";
/// Message kind: a plain text notice sent via `sendMessage`.
pub const KIND_MESSAGE: &str = "message";

/// A row from the `notifications` table.
///
/// Rows are written at send time for audit and operational visibility.
/// Failed deliveries are recorded, never re-driven automatically.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub chat_id: i64,
    pub kind: String,
    /// The delivered payload (photo URLs, caption) as JSON.
    pub payload: serde_json::Value,
    pub is_sent: bool,
    pub attempts: i32,
    pub created_at: Timestamp,
}
