//! Shared fixtures for pipeline integration tests.

use std::time::Duration;

use sqlx::PgPool;

use pixora_db::models::avatar::Avatar;
use pixora_db::models::job::{CreateJob, Job};
use pixora_db::models::status::AvatarStatus;
use pixora_db::models::style::Style;
use pixora_db::models::user::User;
use pixora_db::repositories::{AvatarRepo, JobRepo, StyleRepo, UserRepo};
use pixora_pipeline::PipelineConfig;

/// Pipeline config pointing every external service at an unroutable
/// local port, so a test that unexpectedly reaches one fails fast
/// instead of calling out of the test environment.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        max_units_per_job: 10,
        submit_concurrency: 2,
        chunk_size: 4,
        poll_batch_size: 20,
        poll_budget: Duration::from_secs(25),
        task_max_wait_secs: 300,
        engine_api_url: "http://127.0.0.1:9".to_string(),
        engine_api_key: String::new(),
        storage_api_url: None,
        storage_api_key: String::new(),
        telegram_bot_token: "000:test".to_string(),
        payment_api_url: "http://127.0.0.1:9".to_string(),
        payment_api_key: String::new(),
        queue: None,
    }
}

/// One seeded user with a ready avatar and a three-template style.
pub struct Fixture {
    pub user: User,
    pub avatar: Avatar,
    pub style: Style,
}

/// Seed the catalog rows every orchestration test needs.
pub async fn seed(pool: &PgPool) -> Fixture {
    let user = UserRepo::create(pool, 777_001).await.unwrap();
    let avatar = AvatarRepo::create(
        pool,
        user.id,
        &serde_json::json!([
            "https://cdn.example.com/ref/1.jpg",
            "https://cdn.example.com/ref/2.jpg",
            "https://cdn.example.com/ref/3.jpg",
        ]),
        AvatarStatus::Ready,
    )
    .await
    .unwrap();
    let style = StyleRepo::create(pool, "Noir", "noir portrait", "film grain")
        .await
        .unwrap();
    for (position, template) in ["rain-soaked street", "smoky bar", "rooftop at dusk"]
        .iter()
        .enumerate()
    {
        StyleRepo::add_prompt(pool, style.id, position as i32, template)
            .await
            .unwrap();
    }
    Fixture {
        user,
        avatar,
        style,
    }
}

/// Create a job in `pending` for the fixture's avatar and style.
pub async fn create_job(pool: &PgPool, fx: &Fixture, requested_count: i32) -> Job {
    JobRepo::create(
        pool,
        &CreateJob {
            avatar_id: fx.avatar.id,
            style_id: fx.style.id,
            payment_id: None,
            requested_count,
        },
    )
    .await
    .unwrap()
}

/// Create a job and move it to `processing`, as the dispatcher would.
pub async fn start_job(pool: &PgPool, fx: &Fixture, requested_count: i32) -> Job {
    let job = create_job(pool, fx, requested_count).await;
    assert!(JobRepo::try_start(pool, job.id).await.unwrap());
    JobRepo::find_by_id(pool, job.id).await.unwrap().unwrap()
}
