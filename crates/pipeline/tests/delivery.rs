//! Result delivery: batch planning, captions, and recorded outcomes.
//!
//! The bot client points at an unroutable port, so every send attempt
//! fails at the transport. Delivery must still record each attempt and
//! keep going.

mod common;

use sqlx::PgPool;

use pixora_db::repositories::{NotificationRepo, PhotoRepo};
use pixora_pipeline::{DeliveryReport, Notifier};
use pixora_telegram::BotApi;

fn offline_notifier(pool: &PgPool) -> Notifier {
    Notifier::with_bot(
        pool.clone(),
        BotApi::with_base_url("000:test", "http://127.0.0.1:9"),
    )
}

/// Twelve photos go out as two media groups; both attempts are
/// recorded with their outcome and the caption rides on the first
/// batch only.
#[sqlx::test(migrations = "../../db/migrations")]
async fn delivery_batches_and_records_every_attempt(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 12).await;
    for i in 0..12 {
        PhotoRepo::create(
            &pool,
            fx.avatar.id,
            fx.style.id,
            &format!("noir portrait, unit {i}"),
            &format!("https://cdn.example.com/{i}.jpg"),
        )
        .await
        .unwrap();
    }

    let report = offline_notifier(&pool)
        .deliver_job_results(&job)
        .await
        .unwrap();
    assert_eq!(report.batches_sent, 0);
    assert_eq!(report.batches_failed, 2);

    let notices = NotificationRepo::list_recent(&pool, 10).await.unwrap();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.kind == "media_group" && !n.is_sent));

    let mut sizes: Vec<usize> = notices
        .iter()
        .map(|n| n.payload["media"].as_array().unwrap().len())
        .collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![2, 10]);

    let captioned = notices
        .iter()
        .filter(|n| n.payload["caption"].is_string())
        .count();
    assert_eq!(captioned, 1);
}

/// One photo skips the media group and goes out as a plain photo.
#[sqlx::test(migrations = "../../db/migrations")]
async fn single_photo_goes_out_as_a_plain_photo(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 1).await;
    PhotoRepo::create(
        &pool,
        fx.avatar.id,
        fx.style.id,
        "noir portrait, unit 0",
        "https://cdn.example.com/0.jpg",
    )
    .await
    .unwrap();

    let report = offline_notifier(&pool)
        .deliver_job_results(&job)
        .await
        .unwrap();
    assert_eq!(report.batches_failed, 1);

    let notices = NotificationRepo::list_recent(&pool, 10).await.unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, "photo");
    assert!(!notices[0].is_sent);
    assert_eq!(notices[0].payload["photo"], "https://cdn.example.com/0.jpg");
    assert!(notices[0].payload["caption"].is_string());
}

/// A completed job with no photos delivers nothing and records nothing.
#[sqlx::test(migrations = "../../db/migrations")]
async fn completed_job_without_photos_sends_nothing(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 2).await;

    let report = offline_notifier(&pool)
        .deliver_job_results(&job)
        .await
        .unwrap();
    assert_eq!(report, DeliveryReport::default());
    assert!(NotificationRepo::list_recent(&pool, 10)
        .await
        .unwrap()
        .is_empty());
}

/// A failure notice that cannot be sent is still recorded for operators.
#[sqlx::test(migrations = "../../db/migrations")]
async fn failure_notice_is_recorded_when_send_fails(pool: PgPool) {
    let fx = common::seed(&pool).await;
    let job = common::start_job(&pool, &fx, 1).await;

    let text = "Generation failed: 1/1 photos failed to generate.";
    offline_notifier(&pool)
        .notify_failure(&job, text)
        .await
        .unwrap();

    let notices = NotificationRepo::list_recent(&pool, 10).await.unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, "message");
    assert!(!notices[0].is_sent);
    assert_eq!(notices[0].chat_id, fx.user.chat_id);
    assert_eq!(notices[0].payload["text"], text);
}
