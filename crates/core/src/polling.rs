//! Poll-cycle constants and the task timeout decision.

use crate::types::Timestamp;

/// Default maximum time a task may sit unresolved before the poller
/// forces it to failed (5 minutes).
pub const DEFAULT_TASK_MAX_WAIT_SECS: u64 = 300;

/// Default number of pending tasks inspected per poll cycle.
pub const DEFAULT_POLL_BATCH_SIZE: i64 = 20;

/// Default wall-clock budget for one poll cycle. Kept under the
/// hosting platform's execution ceiling; tasks not reached are picked
/// up by the next scheduled run.
pub const DEFAULT_POLL_BUDGET_SECS: u64 = 25;

/// Error message recorded on a task that exceeded the maximum wait.
pub const TIMEOUT_REASON: &str = "generation timed out";

/// Whether a task created at `created_at` has exceeded the maximum
/// wait as of `now`.
pub fn is_expired(created_at: Timestamp, now: Timestamp, max_wait_secs: u64) -> bool {
    let age = now.signed_duration_since(created_at);
    age >= chrono::Duration::seconds(max_wait_secs as i64)
}
