//! Completion aggregation: deciding when a job is done.
//!
//! Runs after every poll cycle over all `processing` jobs. The decision
//! itself is the pure [`evaluate_outcome`] function; this module wires
//! it to the task counts and performs the guarded job transition. The
//! conditional update means that of any number of concurrent sweeps,
//! exactly one observes the transition and owns the downstream effects
//! (delivery or compensation).

use sqlx::PgPool;

use pixora_core::outcome::{evaluate_outcome, failure_message, JobOutcome};
use pixora_db::models::job::Job;
use pixora_db::models::status::JobStatus;
use pixora_db::repositories::{JobRepo, TaskRepo};

use crate::error::PipelineResult;

/// A terminal transition this aggregator pass performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The job moved to `completed`; every unit produced a photo.
    Completed { completed: i64 },
    /// The job moved to `failed`; at least one unit did not.
    Failed { failed: i64, total: i64 },
}

/// Derives and applies terminal job transitions from task populations.
#[derive(Clone)]
pub struct Aggregator {
    pool: PgPool,
}

impl Aggregator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Evaluate one job and apply its terminal transition if it has one.
    ///
    /// Returns `Some` only when THIS call performed the transition; the
    /// caller then owns delivery or compensation. `None` means the job
    /// is still open, or another sweep already closed it.
    pub async fn evaluate_job(&self, job: &Job) -> PipelineResult<Option<Resolution>> {
        if job.status_id != JobStatus::Processing.id() {
            return Ok(None);
        }

        let counts = TaskRepo::status_counts(&self.pool, job.id).await?;
        match evaluate_outcome(job.requested_count as i64, counts) {
            JobOutcome::AwaitingTasks | JobOutcome::InFlight => Ok(None),
            JobOutcome::Completed { completed } => {
                if JobRepo::complete(&self.pool, job.id, completed as i32).await? {
                    tracing::info!(job_id = job.id, completed, "Job completed");
                    Ok(Some(Resolution::Completed { completed }))
                } else {
                    tracing::debug!(job_id = job.id, "Job completion raced, already closed");
                    Ok(None)
                }
            }
            JobOutcome::Failed { failed, total } => {
                let message = failure_message(failed, total);
                let completed = counts.completed as i32;
                if JobRepo::fail(&self.pool, job.id, completed, &message).await? {
                    tracing::warn!(job_id = job.id, failed, total, "Job failed");
                    Ok(Some(Resolution::Failed { failed, total }))
                } else {
                    tracing::debug!(job_id = job.id, "Job failure raced, already closed");
                    Ok(None)
                }
            }
        }
    }
}
