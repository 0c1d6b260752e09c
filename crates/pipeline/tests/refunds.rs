//! Refund-at-most-once: the local payment flip and the engine that
//! drives it. Engine tests point the gateway at an unroutable port, so
//! any branch that reaches the processor fails loudly.

mod common;

use sqlx::PgPool;

use pixora_db::models::job::{CreateJob, Job};
use pixora_db::models::status::PaymentStatus;
use pixora_db::repositories::{JobRepo, PaymentRepo};
use pixora_pipeline::{RefundEngine, RefundOutcome};

async fn failed_job(pool: &PgPool, fx: &common::Fixture, payment_id: Option<i64>) -> Job {
    JobRepo::create(
        pool,
        &CreateJob {
            avatar_id: fx.avatar.id,
            style_id: fx.style.id,
            payment_id,
            requested_count: 1,
        },
    )
    .await
    .unwrap()
}

/// The succeeded-to-refunded flip has exactly one winner.
#[sqlx::test(migrations = "../../db/migrations")]
async fn refund_flip_has_a_single_winner(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let payment = PaymentRepo::create(
        &pool,
        fx.user.id,
        "prov-123",
        49_900,
        "RUB",
        PaymentStatus::Succeeded,
    )
    .await
    .unwrap();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let pool = pool.clone();
        let payment_id = payment.id;
        handles.push(tokio::spawn(async move {
            PaymentRepo::mark_refunded(&pool, payment_id).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let payment = PaymentRepo::find_by_id(&pool, payment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status_id, PaymentStatus::Refunded.id());
}

/// A payment that never succeeded cannot be refunded.
#[sqlx::test(migrations = "../../db/migrations")]
async fn pending_payment_cannot_be_refunded(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let payment = PaymentRepo::create(
        &pool,
        fx.user.id,
        "prov-124",
        49_900,
        "RUB",
        PaymentStatus::Pending,
    )
    .await
    .unwrap();

    assert!(!PaymentRepo::mark_refunded(&pool, payment.id).await.unwrap());
}

/// Compensation's fallback lookup picks the newest succeeded payment
/// and ignores refunded ones.
#[sqlx::test(migrations = "../../db/migrations")]
async fn fallback_lookup_skips_refunded_payments(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let older = PaymentRepo::create(
        &pool,
        fx.user.id,
        "prov-125",
        49_900,
        "RUB",
        PaymentStatus::Succeeded,
    )
    .await
    .unwrap();
    let newer = PaymentRepo::create(
        &pool,
        fx.user.id,
        "prov-126",
        49_900,
        "RUB",
        PaymentStatus::Succeeded,
    )
    .await
    .unwrap();

    assert!(PaymentRepo::mark_refunded(&pool, newer.id).await.unwrap());

    let found = PaymentRepo::latest_succeeded_for_user(&pool, fx.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, older.id);
}

/// An already-refunded payment short-circuits before the processor is
/// ever contacted.
#[sqlx::test(migrations = "../../db/migrations")]
async fn already_refunded_payment_is_not_sent_to_the_processor(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let payment = PaymentRepo::create(
        &pool,
        fx.user.id,
        "prov-127",
        49_900,
        "RUB",
        PaymentStatus::Succeeded,
    )
    .await
    .unwrap();
    assert!(PaymentRepo::mark_refunded(&pool, payment.id).await.unwrap());
    let job = failed_job(&pool, &fx, Some(payment.id)).await;

    let engine = RefundEngine::new(pool.clone(), &common::test_config());
    let outcome = engine.refund_for_job(&job).await.unwrap();
    assert_eq!(outcome, RefundOutcome::AlreadyRefunded);
}

/// A job whose user never paid is reported, not treated as an error.
#[sqlx::test(migrations = "../../db/migrations")]
async fn job_without_payment_reports_nothing_to_refund(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = failed_job(&pool, &fx, None).await;

    let engine = RefundEngine::new(pool.clone(), &common::test_config());
    let outcome = engine.refund_for_job(&job).await.unwrap();
    assert_eq!(outcome, RefundOutcome::NoPaymentFound);
}

/// A processor error propagates with the payment still succeeded, so a
/// later invocation can try the refund again.
#[sqlx::test(migrations = "../../db/migrations")]
async fn processor_error_leaves_payment_succeeded(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let payment = PaymentRepo::create(
        &pool,
        fx.user.id,
        "prov-128",
        49_900,
        "RUB",
        PaymentStatus::Succeeded,
    )
    .await
    .unwrap();
    let job = failed_job(&pool, &fx, Some(payment.id)).await;

    let engine = RefundEngine::new(pool.clone(), &common::test_config());
    assert!(engine.refund_for_job(&job).await.is_err());

    let payment = PaymentRepo::find_by_id(&pool, payment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status_id, PaymentStatus::Succeeded.id());
}
