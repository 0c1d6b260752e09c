//! Task (unit of work) entity model and DTOs.

use pixora_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `tasks` table: one unit of work within a job,
/// corresponding to a single requested photo.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub job_id: DbId,
    /// Position within the job. Determines output ordering and the
    /// storage key of the re-hosted image.
    pub ordinal: i32,
    pub prompt: String,
    /// Handle returned by the external engine at submission. `None`
    /// when submission itself failed and the task was created failed.
    pub engine_task_id: Option<String>,
    pub status_id: StatusId,
    /// Number of poll cycles that observed this task still pending.
    pub attempts: i32,
    pub result_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
