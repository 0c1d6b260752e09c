//! In-process poll loop for deployments without an external scheduler.
//!
//! Runs one poll cycle per tick on a fixed interval until cancelled.
//! Deployments whose scheduler calls `POST /internal/poll` disable this
//! via `POLL_LOOP_ENABLED=false`.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use pixora_pipeline::{PipelineConfig, TaskPoller};

/// Run the poll loop until `cancel` is triggered.
///
/// The poller is rebuilt each tick from fresh environment-derived
/// configuration, matching the stateless trigger endpoints.
pub async fn run(pool: PgPool, interval_secs: u64, cancel: CancellationToken) {
    tracing::info!(interval_secs, "In-process poll loop started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Poll loop stopping");
                break;
            }
            _ = interval.tick() => {
                let poller = TaskPoller::new(pool.clone(), Arc::new(PipelineConfig::from_env()));
                match poller.run_cycle().await {
                    Ok(report) => {
                        if report.inspected > 0 || report.jobs_closed > 0 {
                            tracing::info!(
                                inspected = report.inspected,
                                jobs_closed = report.jobs_closed,
                                "Poll tick finished",
                            );
                        } else {
                            tracing::debug!("Poll tick: nothing to do");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Poll tick failed");
                    }
                }
            }
        }
    }
}
