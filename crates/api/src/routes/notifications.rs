//! Operational visibility into delivery attempts.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use pixora_db::models::notification::Notification;
use pixora_db::repositories::NotificationRepo;

use crate::error::AppResult;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;

#[derive(Deserialize)]
struct ListParams {
    limit: Option<i64>,
}

/// GET /api/v1/notifications -- recent delivery attempts, newest first.
async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Notification>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 500);
    let items = NotificationRepo::list_recent(&state.pool, limit).await?;
    Ok(Json(items))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_notifications))
}
