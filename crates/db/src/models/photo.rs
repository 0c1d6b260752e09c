//! Generated photo entity model.

use pixora_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `photos` table: one delivered generation result.
///
/// At most one photo exists per (avatar, style, prompt) tuple, enforced
/// by an existence check before insert rather than a constraint, so
/// ingestion can be re-run after a partial failure.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Photo {
    pub id: DbId,
    pub avatar_id: DbId,
    pub style_id: DbId,
    pub prompt: String,
    pub url: String,
    pub created_at: Timestamp,
}
