//! The aggregator's terminal decisions over real task populations.

mod common;

use sqlx::PgPool;

use pixora_db::models::status::{JobStatus, TaskStatus};
use pixora_db::repositories::{JobRepo, TaskRepo};
use pixora_pipeline::{Aggregator, Resolution};

async fn seed_task(
    pool: &PgPool,
    job_id: i64,
    ordinal: i32,
    status: TaskStatus,
) -> i64 {
    let task = TaskRepo::create_if_absent(
        pool,
        job_id,
        ordinal,
        &format!("prompt {ordinal}"),
        &format!("eng-{ordinal}"),
    )
    .await
    .unwrap()
    .unwrap();
    match status {
        TaskStatus::Pending => {}
        TaskStatus::Completed => {
            assert!(TaskRepo::mark_completed(pool, task.id, "https://cdn/x.jpg")
                .await
                .unwrap());
        }
        TaskStatus::Failed => {
            assert!(TaskRepo::mark_failed(pool, task.id, "boom").await.unwrap());
        }
    }
    task.id
}

/// All units completed: the job closes as completed with the count.
#[sqlx::test(migrations = "../../db/migrations")]
async fn all_units_completed_closes_job(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 2).await;
    seed_task(&pool, job.id, 0, TaskStatus::Completed).await;
    seed_task(&pool, job.id, 1, TaskStatus::Completed).await;

    let aggregator = Aggregator::new(pool.clone());
    let resolution = aggregator.evaluate_job(&job).await.unwrap();
    assert_eq!(resolution, Some(Resolution::Completed { completed: 2 }));

    let job = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Completed.id());
    assert_eq!(job.completed_count, 2);
}

/// Partial success is failure, with the aggregate message on the job.
#[sqlx::test(migrations = "../../db/migrations")]
async fn partial_failure_closes_job_as_failed(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 3).await;
    seed_task(&pool, job.id, 0, TaskStatus::Completed).await;
    seed_task(&pool, job.id, 1, TaskStatus::Failed).await;
    seed_task(&pool, job.id, 2, TaskStatus::Failed).await;

    let aggregator = Aggregator::new(pool.clone());
    let resolution = aggregator.evaluate_job(&job).await.unwrap();
    assert_eq!(resolution, Some(Resolution::Failed { failed: 2, total: 3 }));

    let job = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Failed.id());
    assert_eq!(job.completed_count, 1);
    assert_eq!(
        job.error_message.as_deref(),
        Some("2/3 photos failed to generate")
    );
}

/// Fewer tasks than requested means dispatch is still running; the job
/// stays open even if every existing task is terminal.
#[sqlx::test(migrations = "../../db/migrations")]
async fn incomplete_population_keeps_job_open(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 3).await;
    seed_task(&pool, job.id, 0, TaskStatus::Completed).await;

    let aggregator = Aggregator::new(pool.clone());
    assert_eq!(aggregator.evaluate_job(&job).await.unwrap(), None);

    let job = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Processing.id());
}

/// A single pending task keeps the job open past any failures.
#[sqlx::test(migrations = "../../db/migrations")]
async fn pending_task_keeps_job_open(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 2).await;
    seed_task(&pool, job.id, 0, TaskStatus::Failed).await;
    seed_task(&pool, job.id, 1, TaskStatus::Pending).await;

    let aggregator = Aggregator::new(pool.clone());
    assert_eq!(aggregator.evaluate_job(&job).await.unwrap(), None);
}

/// Only the first evaluation owns the transition; a replay on the same
/// stale job snapshot resolves to nothing.
#[sqlx::test(migrations = "../../db/migrations")]
async fn second_evaluation_does_not_own_transition(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 1).await;
    seed_task(&pool, job.id, 0, TaskStatus::Completed).await;

    let aggregator = Aggregator::new(pool.clone());
    assert!(aggregator.evaluate_job(&job).await.unwrap().is_some());
    // Same pre-transition snapshot, as a racing sweep would hold.
    assert_eq!(aggregator.evaluate_job(&job).await.unwrap(), None);
}

/// A job already terminal is skipped without touching its tasks.
#[sqlx::test(migrations = "../../db/migrations")]
async fn terminal_job_is_skipped(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 1).await;
    seed_task(&pool, job.id, 0, TaskStatus::Failed).await;
    assert!(JobRepo::fail(&pool, job.id, 0, "1/1 photos failed to generate")
        .await
        .unwrap());

    let job = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    let aggregator = Aggregator::new(pool.clone());
    assert_eq!(aggregator.evaluate_job(&job).await.unwrap(), None);
}
