//! Liveness probe, mounted at the root so load balancers and the
//! external scheduler can hit it without the `/api/v1` prefix.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
}

/// GET /health. The process answers even when Postgres is down, but
/// reports itself degraded so probes can distinguish the two.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = pixora_db::health_check(&state.pool).await.is_ok();
    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
