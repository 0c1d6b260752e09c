//! Generation job entity model and DTOs.

use pixora_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `jobs` table: one user-visible generation request
/// producing a fixed number of photos.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub avatar_id: DbId,
    pub style_id: DbId,
    /// Payment that funded this job, when linked at admission.
    pub payment_id: Option<DbId>,
    pub status_id: StatusId,
    pub requested_count: i32,
    pub completed_count: i32,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new job at admission time.
#[derive(Debug, Deserialize)]
pub struct CreateJob {
    pub avatar_id: DbId,
    pub style_id: DbId,
    pub payment_id: Option<DbId>,
    pub requested_count: i32,
}
