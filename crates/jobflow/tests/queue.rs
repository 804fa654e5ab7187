mod common;

use common::setup_db;
use serial_test::serial;
use uuid::Uuid;

use jobflow::queue::{next_delay_seconds, RetryConfig, TaskQueue, TaskRunner};
use jobflow::scheduler::Scheduler;

const FEED: &str = "https://feeds.example/jobs.xml";

fn no_jitter() -> RetryConfig {
    RetryConfig {
        base_seconds: 1,
        max_seconds: 60,
        jitter_pct: 0.0, // deterministic test
    }
}

async fn force_runnable(pool: &sqlx::PgPool, task_id: Uuid) {
    sqlx::query("UPDATE import_tasks SET run_at = now() WHERE id = $1")
        .bind(task_id)
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
#[serial]
async fn lease_is_exclusive_and_counts_attempts() {
    let pool = setup_db().await;
    let queue = TaskQueue::new(pool.clone(), 3);

    let task_id = queue.enqueue(FEED).await.unwrap();

    let task = queue.lease_one("worker-a", 30).await.unwrap().unwrap();
    assert_eq!(task.id, task_id);
    assert_eq!(task.feed_url, FEED);
    assert_eq!(task.status, "running");
    assert_eq!(task.attempts, 1);
    assert_eq!(task.locked_by.as_deref(), Some("worker-a"));
    assert!(task.lock_expires_at.is_some());

    // invisible to other workers while leased
    assert!(queue.lease_one("worker-b", 30).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn retry_schedules_increasing_run_at() {
    let pool = setup_db().await;
    let queue = TaskQueue::new(pool.clone(), 10);
    let runner = TaskRunner::new(queue.clone(), no_jitter());

    let task_id = queue.enqueue(FEED).await.unwrap();

    // attempt 1 fails -> requeued 1s out
    let task = queue.lease_one("worker-a", 30).await.unwrap().unwrap();
    runner.on_failure(&task, "worker-a", "boom 1").await.unwrap();

    let after_first = queue.get_task(task_id).await.unwrap().unwrap();
    assert_eq!(after_first.status, "queued");
    assert_eq!(after_first.last_error.as_deref(), Some("boom 1"));
    let run_at1 = after_first.run_at;

    force_runnable(&pool, task_id).await;

    // attempt 2 fails -> delay doubles
    let task = queue.lease_one("worker-a", 30).await.unwrap().unwrap();
    assert_eq!(task.attempts, 2);
    runner.on_failure(&task, "worker-a", "boom 2").await.unwrap();

    let after_second = queue.get_task(task_id).await.unwrap().unwrap();
    assert!(
        after_second.run_at > run_at1,
        "expected increasing backoff run_at"
    );
}

#[tokio::test]
#[serial]
async fn exhausted_attempts_dead_letter() {
    let pool = setup_db().await;
    let queue = TaskQueue::new(pool.clone(), 2);
    let runner = TaskRunner::new(queue.clone(), no_jitter());

    let task_id = queue.enqueue(FEED).await.unwrap();

    let task = queue.lease_one("worker-a", 30).await.unwrap().unwrap();
    runner.on_failure(&task, "worker-a", "boom").await.unwrap();
    force_runnable(&pool, task_id).await;

    let task = queue.lease_one("worker-a", 30).await.unwrap().unwrap();
    assert_eq!(task.attempts, 2);
    runner.on_failure(&task, "worker-a", "boom").await.unwrap();

    let dead = queue.get_task(task_id).await.unwrap().unwrap();
    assert_eq!(dead.status, "dead");
    assert_eq!(dead.dead_reason.as_deref(), Some("MAX_ATTEMPTS_EXCEEDED"));
    assert!(dead.dead_at.is_some());

    // abandoned for good
    assert!(queue.lease_one("worker-a", 30).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn succeeded_tasks_leave_the_queue() {
    let pool = setup_db().await;
    let queue = TaskQueue::new(pool.clone(), 3);
    let runner = TaskRunner::new(queue.clone(), no_jitter());

    let task_id = queue.enqueue(FEED).await.unwrap();

    let task = queue.lease_one("worker-a", 30).await.unwrap().unwrap();
    runner.on_success(&task, "worker-a").await.unwrap();

    let done = queue.get_task(task_id).await.unwrap().unwrap();
    assert_eq!(done.status, "succeeded");
    assert!(done.locked_by.is_none());
    assert!(queue.lease_one("worker-a", 30).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn expired_leases_are_reaped_and_redelivered() {
    let pool = setup_db().await;
    let queue = TaskQueue::new(pool.clone(), 3);

    let task_id = queue.enqueue(FEED).await.unwrap();
    queue.lease_one("worker-a", 30).await.unwrap().unwrap();

    // worker-a dies; its lease expires
    sqlx::query("UPDATE import_tasks SET lock_expires_at = now() - interval '1 second' WHERE id = $1")
        .bind(task_id)
        .execute(&pool)
        .await
        .unwrap();

    let reaped = queue.reap_expired_locks().await.unwrap();
    assert_eq!(reaped, 1);

    let again = queue.lease_one("worker-b", 30).await.unwrap().unwrap();
    assert_eq!(again.id, task_id);
    assert_eq!(again.attempts, 2);
    assert_eq!(again.locked_by.as_deref(), Some("worker-b"));
}

#[tokio::test]
#[serial]
async fn trigger_all_enqueues_every_feed() {
    let pool = setup_db().await;
    let queue = TaskQueue::new(pool.clone(), 3);

    let scheduler = Scheduler::new(
        queue.clone(),
        vec![
            "https://feeds.example/a.xml".to_string(),
            "https://feeds.example/b.xml".to_string(),
        ],
        "0 * * * *",
    );

    let summary = scheduler.trigger_all().await;
    assert_eq!(summary.queued, 2);
    assert_eq!(summary.feed_urls.len(), 2);

    let (queued, running, dead) = queue.depth().await.unwrap();
    assert_eq!((queued, running, dead), (2, 0, 0));
}

#[tokio::test]
#[serial]
async fn scheduler_start_and_stop_are_idempotent() {
    let pool = setup_db().await;
    let queue = TaskQueue::new(pool.clone(), 3);

    let scheduler = std::sync::Arc::new(Scheduler::new(
        queue,
        vec!["https://feeds.example/a.xml".to_string()],
        // yearly, so nothing fires during the test
        "0 0 0 1 1 *",
    ));

    scheduler.start().await.unwrap();
    scheduler.start().await.unwrap();
    scheduler.stop().await.unwrap();
    scheduler.stop().await.unwrap();
}

#[test]
fn backoff_delay_doubles_and_caps() {
    let cfg = RetryConfig {
        base_seconds: 1,
        max_seconds: 8,
        jitter_pct: 0.0,
    };
    let mut rng = rand::thread_rng();

    assert_eq!(next_delay_seconds(1, &cfg, &mut rng), 1);
    assert_eq!(next_delay_seconds(2, &cfg, &mut rng), 2);
    assert_eq!(next_delay_seconds(3, &cfg, &mut rng), 4);
    assert_eq!(next_delay_seconds(4, &cfg, &mut rng), 8);
    assert_eq!(next_delay_seconds(10, &cfg, &mut rng), 8);
}
