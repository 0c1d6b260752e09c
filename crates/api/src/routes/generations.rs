//! Generation job endpoints: admission, lookup, admin retry.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use pixora_core::error::CoreError;
use pixora_core::types::DbId;
use pixora_db::models::job::Job;
use pixora_db::models::task::Task;
use pixora_db::repositories::{JobRepo, TaskRepo};
use pixora_pipeline::{AdmissionRequest, Dispatcher, PipelineConfig};

use crate::error::AppResult;
use crate::state::AppState;

/// Job detail response: the job row plus its task population.
#[derive(Serialize)]
pub struct GenerationDetail {
    pub job: Job,
    pub tasks: Vec<Task>,
}

/// Pipeline configuration is read from the environment on every
/// invocation rather than cached at startup.
fn build_dispatcher(state: &AppState) -> Dispatcher {
    Dispatcher::new(state.pool.clone(), Arc::new(PipelineConfig::from_env()))
}

/// POST /api/v1/generations -- admit a job and kick off submission.
///
/// Responds 202 once the job is durably `pending` and dispatch has been
/// handed off; generation itself is asynchronous.
async fn create_generation(
    State(state): State<AppState>,
    Json(req): Json<AdmissionRequest>,
) -> AppResult<(StatusCode, Json<Job>)> {
    let dispatcher = build_dispatcher(&state);
    let job = dispatcher.admit(&req).await?;
    dispatcher.dispatch(&job).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// GET /api/v1/generations/{id} -- job detail with its tasks.
async fn get_generation(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<GenerationDetail>> {
    let job = JobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "job",
            id,
        })?;
    let tasks = TaskRepo::list_for_job(&state.pool, id).await?;
    Ok(Json(GenerationDetail { job, tasks }))
}

/// POST /api/v1/generations/{id}/retry -- reset a terminal job and
/// re-run submission. Responds 409 if the job is still active.
async fn retry_generation(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<Job>)> {
    let dispatcher = build_dispatcher(&state);
    let job = dispatcher.retry(id).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_generation))
        .route("/{id}", get(get_generation))
        .route("/{id}/retry", post(retry_generation))
}
