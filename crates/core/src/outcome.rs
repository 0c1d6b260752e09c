//! Job-level outcome derivation from a task population.
//!
//! The Completion Aggregator loads the task counts for a job and feeds
//! them through [`evaluate_outcome`]. The decision itself is pure so it
//! can be tested exhaustively without a database.

/// Per-status task counts for a single job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// Tasks still awaiting an engine result.
    pub pending: i64,
    /// Tasks with a persisted photo.
    pub completed: i64,
    /// Tasks that failed or timed out.
    pub failed: i64,
}

impl TaskCounts {
    /// Total number of task rows created so far.
    pub fn total(&self) -> i64 {
        self.pending + self.completed + self.failed
    }
}

/// What the aggregator should do with a `processing` job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Fewer tasks exist than the job requested. Chunked dispatch is
    /// still building the population out; do not close the job.
    AwaitingTasks,
    /// At least one task has not resolved yet.
    InFlight,
    /// Every task completed. Carries the completed count.
    Completed { completed: i64 },
    /// All tasks terminal, at least one failed. Partial success still
    /// counts as failure: the product promise is all photos or refund.
    Failed { failed: i64, total: i64 },
}

/// Derive the outcome for a job from its requested unit count and the
/// current task counts.
pub fn evaluate_outcome(requested: i64, counts: TaskCounts) -> JobOutcome {
    if counts.total() < requested {
        return JobOutcome::AwaitingTasks;
    }
    if counts.pending > 0 {
        return JobOutcome::InFlight;
    }
    if counts.failed == 0 {
        JobOutcome::Completed {
            completed: counts.completed,
        }
    } else {
        JobOutcome::Failed {
            failed: counts.failed,
            total: counts.total(),
        }
    }
}

/// Human-readable aggregate message stored on a failed job.
pub fn failure_message(failed: i64, total: i64) -> String {
    format!("{failed}/{total} photos failed to generate")
}
