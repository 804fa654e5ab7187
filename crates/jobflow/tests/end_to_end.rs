mod common;

use common::{setup_db, StubFeed};
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

use jobflow::imports::{ImportWorker, RunLogRepo};
use jobflow::jobs::JobStore;
use jobflow::queue::{RetryConfig, TaskQueue, TaskRunner, WorkerPool};

#[tokio::test]
#[serial]
async fn queued_task_is_drained_by_the_pool() {
    let pool = setup_db().await;
    let queue = TaskQueue::new(pool.clone(), 3);

    let task_id = queue
        .enqueue("https://feeds.example/jobs.xml")
        .await
        .unwrap();

    let feed = Arc::new(StubFeed {
        items: vec![
            json!({ "guid": "e2e-1", "title": "First" }),
            json!({ "guid": "e2e-2", "title": "Second" }),
        ],
    });
    let importer = Arc::new(ImportWorker::new(
        feed,
        JobStore::new(pool.clone()),
        RunLogRepo::new(pool.clone()),
    ));
    let runner = TaskRunner::new(queue.clone(), RetryConfig::default());

    let handles = WorkerPool::new(
        queue.clone(),
        importer,
        runner,
        "e2e".to_string(),
        2,
        30,
    )
    .spawn();

    // The pool polls every 250ms; allow a few seconds for the drain.
    let mut status = String::new();
    for _ in 0..40 {
        status = queue.get_task(task_id).await.unwrap().unwrap().status;
        if status == "succeeded" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    for handle in handles {
        handle.abort();
    }

    assert_eq!(status, "succeeded");
    assert_eq!(JobStore::new(pool.clone()).count_jobs().await.unwrap(), 2);

    let runs = RunLogRepo::new(pool.clone()).list_recent(10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].attempt, 1);
    assert_eq!(runs[0].total_imported, 2);
    assert_eq!(runs[0].new_jobs, 2);
}
