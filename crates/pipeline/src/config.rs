//! Pipeline configuration loaded from environment variables.
//!
//! Loaded once per invocation, never cached process-wide: the pipeline
//! runs across independent, memoryless invocations and must not assume
//! two of them see the same settings.

use std::time::Duration;

use pixora_core::polling::{
    DEFAULT_POLL_BATCH_SIZE, DEFAULT_POLL_BUDGET_SECS, DEFAULT_TASK_MAX_WAIT_SECS,
};

/// Default ceiling on units per job.
const DEFAULT_MAX_UNITS_PER_JOB: u32 = 10;

/// Default fan-out width for engine submissions within one job.
const DEFAULT_SUBMIT_CONCURRENCY: usize = 4;

/// Default number of units per durable-queue chunk.
const DEFAULT_CHUNK_SIZE: u32 = 4;

/// Durable work-queue settings. Present only when a queue is
/// configured; otherwise dispatch runs inline in a detached task.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue service endpoint that accepts publish requests.
    pub url: String,
    /// Bearer token for the queue service.
    pub token: String,
    /// Public base URL of this deployment; the queue calls back to
    /// `{callback_base_url}/internal/dispatch` per chunk.
    pub callback_base_url: String,
}

/// All pipeline tunables and external service endpoints.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Configured ceiling on units per job (further capped by the
    /// style's template count and the hard maximum).
    pub max_units_per_job: u32,
    /// Bounded concurrency for per-unit engine submissions.
    pub submit_concurrency: usize,
    /// Units per durable-queue chunk.
    pub chunk_size: u32,
    /// Pending tasks inspected per poll cycle.
    pub poll_batch_size: i64,
    /// Wall-clock budget for one poll cycle.
    pub poll_budget: Duration,
    /// Maximum seconds a task may stay unresolved before a forced
    /// timeout failure.
    pub task_max_wait_secs: u64,

    /// Image-generation engine endpoint and credentials.
    pub engine_api_url: String,
    pub engine_api_key: String,
    /// Object storage endpoint; `None` disables re-hosting and photos
    /// keep their engine-provided URLs.
    pub storage_api_url: Option<String>,
    pub storage_api_key: String,
    /// Telegram bot token for result delivery.
    pub telegram_bot_token: String,
    /// Payment processor endpoint and credentials.
    pub payment_api_url: String,
    pub payment_api_key: String,

    /// Durable work queue, when configured.
    pub queue: Option<QueueConfig>,
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults
    /// suitable for local development.
    ///
    /// | Env Var                 | Default                   |
    /// |-------------------------|---------------------------|
    /// | `MAX_UNITS_PER_JOB`     | `10`                      |
    /// | `SUBMIT_CONCURRENCY`    | `4`                       |
    /// | `DISPATCH_CHUNK_SIZE`   | `4`                       |
    /// | `POLL_BATCH_SIZE`       | `20`                      |
    /// | `POLL_BUDGET_SECS`      | `25`                      |
    /// | `TASK_MAX_WAIT_SECS`    | `300`                     |
    /// | `ENGINE_API_URL`        | `http://localhost:8700`   |
    /// | `STORAGE_API_URL`       | unset (re-hosting off)    |
    /// | `QUEUE_URL`             | unset (inline dispatch)   |
    pub fn from_env() -> Self {
        let queue = std::env::var("QUEUE_URL").ok().map(|url| QueueConfig {
            url,
            token: std::env::var("QUEUE_TOKEN").unwrap_or_default(),
            callback_base_url: std::env::var("CALLBACK_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
        });

        Self {
            max_units_per_job: env_parse("MAX_UNITS_PER_JOB", DEFAULT_MAX_UNITS_PER_JOB),
            submit_concurrency: env_parse("SUBMIT_CONCURRENCY", DEFAULT_SUBMIT_CONCURRENCY),
            chunk_size: env_parse("DISPATCH_CHUNK_SIZE", DEFAULT_CHUNK_SIZE),
            poll_batch_size: env_parse("POLL_BATCH_SIZE", DEFAULT_POLL_BATCH_SIZE),
            poll_budget: Duration::from_secs(env_parse(
                "POLL_BUDGET_SECS",
                DEFAULT_POLL_BUDGET_SECS,
            )),
            task_max_wait_secs: env_parse("TASK_MAX_WAIT_SECS", DEFAULT_TASK_MAX_WAIT_SECS),
            engine_api_url: std::env::var("ENGINE_API_URL")
                .unwrap_or_else(|_| "http://localhost:8700".into()),
            engine_api_key: std::env::var("ENGINE_API_KEY").unwrap_or_default(),
            storage_api_url: std::env::var("STORAGE_API_URL").ok(),
            storage_api_key: std::env::var("STORAGE_API_KEY").unwrap_or_default(),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            payment_api_url: std::env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "http://localhost:8701".into()),
            payment_api_key: std::env::var("PAYMENT_API_KEY").unwrap_or_default(),
            queue,
        }
    }
}

/// Parse an env var, falling back to `default` when unset or invalid.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
