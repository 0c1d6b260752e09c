use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers.
///
/// Deliberately thin: pipeline components are built per invocation from
/// fresh environment-derived configuration, not held here, so handlers
/// never observe stale settings.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: PgPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
