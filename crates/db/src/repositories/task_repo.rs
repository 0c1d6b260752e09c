//! Repository for the `tasks` table.
//!
//! Tasks are created by the dispatcher (idempotently, keyed on
//! `(job_id, ordinal)`) and mutated only by the poller. A task that has
//! left `pending` is never resubmitted to the engine.

use sqlx::PgPool;

use pixora_core::outcome::TaskCounts;
use pixora_core::types::DbId;

use crate::models::status::TaskStatus;
use crate::models::task::Task;

/// Column list for `tasks` queries.
const COLUMNS: &str = "\
    id, job_id, ordinal, prompt, engine_task_id, status_id, \
    attempts, result_url, error_message, created_at, updated_at";

/// Provides CRUD operations for per-photo work units.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a pending task for `(job_id, ordinal)` unless one already
    /// exists. Re-delivered dispatch chunks hit the unique constraint
    /// and become no-ops; returns the task only when it was inserted.
    pub async fn create_if_absent(
        pool: &PgPool,
        job_id: DbId,
        ordinal: i32,
        prompt: &str,
        engine_task_id: &str,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (job_id, ordinal, prompt, engine_task_id, status_id) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (job_id, ordinal) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(job_id)
            .bind(ordinal)
            .bind(prompt)
            .bind(engine_task_id)
            .bind(TaskStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Insert a task directly in `failed`, for units whose submission to
    /// the engine itself failed. Idempotent like [`Self::create_if_absent`].
    pub async fn create_failed_if_absent(
        pool: &PgPool,
        job_id: DbId,
        ordinal: i32,
        prompt: &str,
        error: &str,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (job_id, ordinal, prompt, status_id, error_message) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (job_id, ordinal) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(job_id)
            .bind(ordinal)
            .bind(prompt)
            .bind(TaskStatus::Failed.id())
            .bind(error)
            .fetch_optional(pool)
            .await
    }

    /// Whether a task already exists for `(job_id, ordinal)`.
    ///
    /// Checked before submitting a unit to the engine so a re-run never
    /// submits work whose task is already on record.
    pub async fn exists(pool: &PgPool, job_id: DbId, ordinal: i32) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE job_id = $1 AND ordinal = $2)",
        )
        .bind(job_id)
        .bind(ordinal)
        .fetch_one(pool)
        .await
    }

    /// Select a bounded batch of pending tasks, oldest first.
    ///
    /// Oldest-first ordering gives fairness and bounded staleness: a
    /// task skipped when a poll cycle runs out of budget is at the
    /// front of the next cycle's batch.
    pub async fn list_pending_batch(pool: &PgPool, limit: i64) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE status_id = $1 \
             ORDER BY created_at ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(TaskStatus::Pending.id())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Mark a pending task completed with its result location.
    ///
    /// Guarded on the current status: a retried poll pass that already
    /// completed the task sees zero rows affected. Callers must persist
    /// the photo BEFORE calling this.
    pub async fn mark_completed(
        pool: &PgPool,
        task_id: DbId,
        result_url: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks \
             SET status_id = $2, result_url = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(task_id)
        .bind(TaskStatus::Completed.id())
        .bind(result_url)
        .bind(TaskStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a pending task failed with the reported reason.
    pub async fn mark_failed(
        pool: &PgPool,
        task_id: DbId,
        error: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks \
             SET status_id = $2, error_message = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(task_id)
        .bind(TaskStatus::Failed.id())
        .bind(error)
        .bind(TaskStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record that another poll cycle observed this task still pending.
    pub async fn bump_attempts(pool: &PgPool, task_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET attempts = attempts + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(task_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Count tasks for a job grouped into the aggregator's buckets.
    pub async fn status_counts(pool: &PgPool, job_id: DbId) -> Result<TaskCounts, sqlx::Error> {
        let row: (i64, i64, i64) = sqlx::query_as(
            "SELECT \
                 COUNT(*) FILTER (WHERE status_id = $2), \
                 COUNT(*) FILTER (WHERE status_id = $3), \
                 COUNT(*) FILTER (WHERE status_id = $4) \
             FROM tasks WHERE job_id = $1",
        )
        .bind(job_id)
        .bind(TaskStatus::Pending.id())
        .bind(TaskStatus::Completed.id())
        .bind(TaskStatus::Failed.id())
        .fetch_one(pool)
        .await?;
        Ok(TaskCounts {
            pending: row.0,
            completed: row.1,
            failed: row.2,
        })
    }

    /// List all tasks of a job ordered by ordinal.
    pub async fn list_for_job(pool: &PgPool, job_id: DbId) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks WHERE job_id = $1 ORDER BY ordinal ASC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    /// Delete all tasks of a job. Used by the admin retry path after
    /// the job row has been reset to `pending`.
    pub async fn delete_for_job(pool: &PgPool, job_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE job_id = $1")
            .bind(job_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
