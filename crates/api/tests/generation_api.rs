mod common;

use axum::http::StatusCode;
use common::{assert_error_code, body_json, build_test_app, get, post_json, seed_catalog};
use sqlx::PgPool;

use pixora_db::models::status::{AvatarStatus, JobStatus};
use pixora_db::repositories::{AvatarRepo, JobRepo};

/// Admission persists a pending job, clamps the unit count to the
/// style's template count, and marks the avatar as generating.
#[sqlx::test(migrations = "../../db/migrations")]
async fn create_generation_admits_job(pool: PgPool) {
    let (_, avatar, style) = seed_catalog(&pool).await;

    let app = build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/generations",
        serde_json::json!({
            "avatar_id": avatar.id,
            "style_id": style.id,
            "payment_id": null,
            "requested_count": 5,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response).await;
    let job_id = json["id"].as_i64().unwrap();
    // Two templates seeded: the request is clamped to 2.
    assert_eq!(json["requested_count"], 2);

    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    // The inline continuation may have taken the lock already.
    assert!(
        job.status_id == JobStatus::Pending.id() || job.status_id == JobStatus::Processing.id()
    );

    let avatar = AvatarRepo::find_by_id(&pool, avatar.id).await.unwrap().unwrap();
    assert_eq!(avatar.status_id, AvatarStatus::Generating.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_generation_unknown_avatar_returns_404(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/generations",
        serde_json::json!({
            "avatar_id": 999_999,
            "style_id": 1,
            "payment_id": null,
            "requested_count": 2,
        }),
    )
    .await;
    assert_error_code(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_generation_zero_count_returns_400(pool: PgPool) {
    let (_, avatar, style) = seed_catalog(&pool).await;

    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/generations",
        serde_json::json!({
            "avatar_id": avatar.id,
            "style_id": style.id,
            "payment_id": null,
            "requested_count": 0,
        }),
    )
    .await;
    assert_error_code(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

/// A payment that belongs to a different user is rejected before any
/// job state is created.
#[sqlx::test(migrations = "../../db/migrations")]
async fn create_generation_foreign_payment_returns_400(pool: PgPool) {
    use pixora_db::models::status::PaymentStatus;
    use pixora_db::repositories::{PaymentRepo, UserRepo};

    let (_, avatar, style) = seed_catalog(&pool).await;
    let other = UserRepo::create(&pool, 888_002).await.unwrap();
    let payment = PaymentRepo::create(&pool, other.id, "prov-x", 9900, "RUB", PaymentStatus::Succeeded)
        .await
        .unwrap();

    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/generations",
        serde_json::json!({
            "avatar_id": avatar.id,
            "style_id": style.id,
            "payment_id": payment.id,
            "requested_count": 2,
        }),
    )
    .await;
    assert_error_code(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_generation_returns_job_with_tasks(pool: PgPool) {
    let (_, avatar, style) = seed_catalog(&pool).await;
    let job = JobRepo::create(
        &pool,
        &pixora_db::models::job::CreateJob {
            avatar_id: avatar.id,
            style_id: style.id,
            payment_id: None,
            requested_count: 2,
        },
    )
    .await
    .unwrap();

    let app = build_test_app(pool);
    let response = get(app, &format!("/api/v1/generations/{}", job.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["job"]["id"].as_i64(), Some(job.id));
    assert!(json["tasks"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_generation_unknown_returns_404(pool: PgPool) {
    let app = build_test_app(pool);
    let response = get(app, "/api/v1/generations/999999").await;
    assert_error_code(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

/// Retrying a job that is not terminal is a conflict.
#[sqlx::test(migrations = "../../db/migrations")]
async fn retry_active_job_returns_409(pool: PgPool) {
    let (_, avatar, style) = seed_catalog(&pool).await;
    let job = JobRepo::create(
        &pool,
        &pixora_db::models::job::CreateJob {
            avatar_id: avatar.id,
            style_id: style.id,
            payment_id: None,
            requested_count: 2,
        },
    )
    .await
    .unwrap();

    let app = build_test_app(pool);
    let response = post_json(
        app,
        &format!("/api/v1/generations/{}/retry", job.id),
        serde_json::json!({}),
    )
    .await;
    assert_error_code(response, StatusCode::CONFLICT, "CONFLICT").await;
}

/// Retrying a failed job resets it and wipes its tasks.
#[sqlx::test(migrations = "../../db/migrations")]
async fn retry_failed_job_resets_it(pool: PgPool) {
    use pixora_db::repositories::TaskRepo;

    let (_, avatar, style) = seed_catalog(&pool).await;
    let job = JobRepo::create(
        &pool,
        &pixora_db::models::job::CreateJob {
            avatar_id: avatar.id,
            style_id: style.id,
            payment_id: None,
            requested_count: 2,
        },
    )
    .await
    .unwrap();
    assert!(JobRepo::try_start(&pool, job.id).await.unwrap());
    TaskRepo::create_failed_if_absent(&pool, job.id, 0, "p", "boom")
        .await
        .unwrap();
    assert!(JobRepo::fail(&pool, job.id, 0, "2/2 photos failed to generate")
        .await
        .unwrap());

    let app = build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/generations/{}/retry", job.id),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // The old task population is gone; a fresh submission owns the job.
    let tasks = TaskRepo::list_for_job(&pool, job.id).await.unwrap();
    assert!(tasks.iter().all(|t| t.error_message.as_deref() != Some("boom")));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn retry_unknown_job_returns_404(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(app, "/api/v1/generations/999999/retry", serde_json::json!({})).await;
    assert_error_code(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}
