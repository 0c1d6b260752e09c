//! Avatar (profile) entity model.

use pixora_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `avatars` table. One avatar per set of uploaded
/// reference photos; jobs are generated against an avatar.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Avatar {
    pub id: DbId,
    pub user_id: DbId,
    pub status_id: StatusId,
    /// Reference image URLs uploaded by the user, as a JSON array.
    pub reference_images: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Avatar {
    /// Reference image URLs as owned strings, skipping non-string
    /// entries (the column is free-form JSON).
    pub fn reference_urls(&self) -> Vec<String> {
        self.reference_images
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
