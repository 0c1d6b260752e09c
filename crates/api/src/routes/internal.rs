//! Internal endpoints driven by the scheduler and the durable queue,
//! not by end users. Both are safe to call repeatedly: every state
//! transition behind them is conditional.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use pixora_pipeline::{ChunkMessage, CycleReport, Dispatcher, PipelineConfig, TaskPoller};

use crate::error::AppResult;
use crate::state::AppState;

/// POST /internal/poll -- run one poll cycle and report the tally.
async fn poll(State(state): State<AppState>) -> AppResult<Json<CycleReport>> {
    let poller = TaskPoller::new(state.pool.clone(), Arc::new(PipelineConfig::from_env()));
    let report = poller.run_cycle().await?;
    Ok(Json(report))
}

/// POST /internal/dispatch -- durable-queue chunk callback.
///
/// A non-2xx response makes the queue redeliver, which downstream
/// existence checks neutralize.
async fn dispatch_chunk(
    State(state): State<AppState>,
    Json(msg): Json<ChunkMessage>,
) -> AppResult<StatusCode> {
    let dispatcher = Dispatcher::new(state.pool.clone(), Arc::new(PipelineConfig::from_env()));
    dispatcher.run_chunk(&msg).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/poll", post(poll))
        .route("/dispatch", post(dispatch_chunk))
}
