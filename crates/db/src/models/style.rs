//! Style (photo pack) entity model.

use pixora_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `styles` table. A style is a themed pack of prompt
/// templates with an optional shared prefix/suffix.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Style {
    pub id: DbId,
    pub name: String,
    pub prompt_prefix: String,
    pub prompt_suffix: String,
    pub created_at: Timestamp,
}
