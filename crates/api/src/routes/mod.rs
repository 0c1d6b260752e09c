//! Route tree for the trigger surface.
//!
//! ```text
//! GET  /health                          liveness + DB ping
//!
//! POST /api/v1/generations              admit a generation job
//! GET  /api/v1/generations/{id}         job detail with its tasks
//! POST /api/v1/generations/{id}/retry   admin retry of a terminal job
//! GET  /api/v1/notifications            recent delivery attempts
//!
//! POST /internal/poll                   scheduler tick: one poll cycle
//! POST /internal/dispatch               durable-queue chunk callback
//! ```

pub mod generations;
pub mod health;
pub mod internal;
pub mod notifications;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/generations", generations::router())
        .nest("/notifications", notifications::router())
}

/// Build the `/internal` route tree (scheduler and queue callbacks).
pub fn internal_routes() -> Router<AppState> {
    internal::router()
}
