//! Repository for the `jobs` table.
//!
//! Every transition is a conditional single-row update. A job may be
//! advanced concurrently by the inline post-admission continuation, the
//! scheduled poller, and an admin retry; whoever loses a conditional
//! update observes zero rows affected and must not act further.

use sqlx::PgPool;

use pixora_core::types::DbId;

use crate::models::job::{CreateJob, Job};
use crate::models::status::{JobStatus, StatusId};

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, avatar_id, style_id, payment_id, status_id, \
    requested_count, completed_count, error_message, \
    created_at, updated_at";

/// Terminal statuses: completed, failed, cancelled.
const TERMINAL_STATUSES: [StatusId; 3] = [
    JobStatus::Completed as StatusId,
    JobStatus::Failed as StatusId,
    JobStatus::Cancelled as StatusId,
];

/// Provides CRUD operations and guarded state transitions for jobs.
pub struct JobRepo;

impl JobRepo {
    /// Create a new job in `pending` with zero completed units.
    pub async fn create(pool: &PgPool, input: &CreateJob) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (avatar_id, style_id, payment_id, status_id, requested_count) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(input.avatar_id)
            .bind(input.style_id)
            .bind(input.payment_id)
            .bind(JobStatus::Pending.id())
            .bind(input.requested_count)
            .fetch_one(pool)
            .await
    }

    /// Atomically transition a job from `pending` to `processing`.
    ///
    /// Returns `true` only for the single caller that wins the race.
    /// Everyone else sees zero rows affected and must exit without
    /// side effects. This is the admission lock for the whole pipeline.
    pub async fn try_start(pool: &PgPool, job_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(job_id)
        .bind(JobStatus::Processing.id())
        .bind(JobStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a `processing` job as completed with its final unit count.
    ///
    /// Returns `true` if this call performed the transition. The guard
    /// on the current status keeps a second aggregator pass from firing
    /// downstream effects twice.
    pub async fn complete(
        pool: &PgPool,
        job_id: DbId,
        completed_count: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, completed_count = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(job_id)
        .bind(JobStatus::Completed.id())
        .bind(completed_count)
        .bind(JobStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a `processing` job as failed with an aggregate message.
    ///
    /// Returns `true` if this call performed the transition; the winner
    /// is the only caller allowed to invoke compensation.
    pub async fn fail(
        pool: &PgPool,
        job_id: DbId,
        completed_count: i32,
        error: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, completed_count = $3, error_message = $4, updated_at = NOW() \
             WHERE id = $1 AND status_id = $5",
        )
        .bind(job_id)
        .bind(JobStatus::Failed.id())
        .bind(completed_count)
        .bind(error)
        .bind(JobStatus::Processing.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a still-`pending` job as failed. Used when admission-side
    /// submission hits an unrecoverable error before the lock is taken.
    pub async fn fail_pending(
        pool: &PgPool,
        job_id: DbId,
        error: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, error_message = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(job_id)
        .bind(JobStatus::Failed.id())
        .bind(error)
        .bind(JobStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reset a terminal job back to `pending` for an admin-initiated
    /// retry. This is the only path by which a job leaves a terminal
    /// state. Returns `false` if the job is not terminal.
    pub async fn reset_for_retry(pool: &PgPool, job_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, completed_count = 0, error_message = NULL, updated_at = NOW() \
             WHERE id = $1 AND status_id IN ($3, $4, $5)",
        )
        .bind(job_id)
        .bind(JobStatus::Pending.id())
        .bind(TERMINAL_STATUSES[0])
        .bind(TERMINAL_STATUSES[1])
        .bind(TERMINAL_STATUSES[2])
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all jobs currently in `processing`, oldest first. The
    /// aggregator sweeps these each poll cycle.
    pub async fn list_processing(pool: &PgPool) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE status_id = $1 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::Processing.id())
            .fetch_all(pool)
            .await
    }
}
