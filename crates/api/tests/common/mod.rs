//! Shared helpers for API integration tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use pixora_api::config::ServerConfig;
use pixora_api::router::build_app_router;
use pixora_api::state::AppState;
use pixora_db::models::avatar::Avatar;
use pixora_db::models::status::AvatarStatus;
use pixora_db::models::style::Style;
use pixora_db::models::user::User;
use pixora_db::repositories::{AvatarRepo, StyleRepo, UserRepo};

/// Build a test `ServerConfig` with safe defaults and no poll loop.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        poll_loop_enabled: false,
        poll_interval_secs: 30,
    }
}

/// Build the full application router with all middleware layers, using
/// the given database pool. Mirrors `main.rs` so tests exercise the
/// production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Issue a POST request with a JSON body against the app.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a JSON error body carries the expected code.
pub async fn assert_error_code(response: Response, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code);
}

/// Seed a user, a ready avatar, and a style with two prompt templates.
pub async fn seed_catalog(pool: &PgPool) -> (User, Avatar, Style) {
    let user = UserRepo::create(pool, 888_001).await.unwrap();
    let avatar = AvatarRepo::create(
        pool,
        user.id,
        &serde_json::json!(["https://cdn.example.com/ref/1.jpg"]),
        AvatarStatus::Ready,
    )
    .await
    .unwrap();
    let style = StyleRepo::create(pool, "Classic", "classic portrait", "soft light")
        .await
        .unwrap();
    StyleRepo::add_prompt(pool, style.id, 0, "garden bench").await.unwrap();
    StyleRepo::add_prompt(pool, style.id, 1, "library desk").await.unwrap();
    (user, avatar, style)
}
