//! The pending-to-processing admission lock and the retry reset.

mod common;

use sqlx::PgPool;

use pixora_db::models::status::JobStatus;
use pixora_db::repositories::{JobRepo, TaskRepo};

/// Of many concurrent starters, exactly one wins the lock.
#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_starts_have_a_single_winner(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::create_job(&pool, &fx, 3).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let job_id = job.id;
        handles.push(tokio::spawn(
            async move { JobRepo::try_start(&pool, job_id).await },
        ));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let job = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Processing.id());
}

/// A second sequential start attempt is a no-op.
#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_trigger_is_harmless(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::create_job(&pool, &fx, 2).await;

    assert!(JobRepo::try_start(&pool, job.id).await.unwrap());
    assert!(!JobRepo::try_start(&pool, job.id).await.unwrap());
}

/// A terminal job can be reset for retry; an active one cannot.
#[sqlx::test(migrations = "../../db/migrations")]
async fn retry_reset_requires_terminal_status(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 2).await;

    // Still processing: reset must refuse.
    assert!(!JobRepo::reset_for_retry(&pool, job.id).await.unwrap());

    assert!(JobRepo::fail(&pool, job.id, 0, "2/2 photos failed to generate")
        .await
        .unwrap());
    assert!(JobRepo::reset_for_retry(&pool, job.id).await.unwrap());

    let job = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Pending.id());
    assert_eq!(job.completed_count, 0);
    assert!(job.error_message.is_none());
}

/// Redelivered dispatch chunks cannot duplicate a unit's task.
#[sqlx::test(migrations = "../../db/migrations")]
async fn redelivered_chunk_creates_no_duplicate_task(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 2).await;

    let first = TaskRepo::create_if_absent(&pool, job.id, 0, "noir portrait, smoky bar", "eng-1")
        .await
        .unwrap();
    assert!(first.is_some());

    let second = TaskRepo::create_if_absent(&pool, job.id, 0, "noir portrait, smoky bar", "eng-9")
        .await
        .unwrap();
    assert!(second.is_none());

    let tasks = TaskRepo::list_for_job(&pool, job.id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].engine_task_id.as_deref(), Some("eng-1"));
}

/// Terminal transitions are single-winner too: of a completion and a
/// failure racing on the same job, only one lands.
#[sqlx::test(migrations = "../../db/migrations")]
async fn terminal_transition_has_a_single_winner(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 1).await;

    let completed = JobRepo::complete(&pool, job.id, 1).await.unwrap();
    let failed = JobRepo::fail(&pool, job.id, 0, "1/1 photos failed to generate")
        .await
        .unwrap();
    assert!(completed);
    assert!(!failed);

    let job = JobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Completed.id());
}
