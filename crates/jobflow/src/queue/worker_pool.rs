use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::imports::ImportWorker;
use crate::queue::repo::TaskQueue;
use crate::queue::runner::TaskRunner;

const IDLE_POLL: Duration = Duration::from_millis(250);
const REAP_INTERVAL: Duration = Duration::from_secs(30);

/// Bounded pool of workers draining the task queue. Each worker leases one
/// task at a time and runs the import pipeline for it; items within a run
/// stay sequential.
pub struct WorkerPool {
    queue: TaskQueue,
    importer: Arc<ImportWorker>,
    runner: TaskRunner,
    worker_id: String,
    concurrency: usize,
    lease_seconds: i64,
}

impl WorkerPool {
    pub fn new(
        queue: TaskQueue,
        importer: Arc<ImportWorker>,
        runner: TaskRunner,
        worker_id: String,
        concurrency: usize,
        lease_seconds: i64,
    ) -> Self {
        Self {
            queue,
            importer,
            runner,
            worker_id,
            concurrency: concurrency.max(1),
            lease_seconds,
        }
    }

    pub fn spawn(self) -> Vec<tokio::task::JoinHandle<()>> {
        (0..self.concurrency)
            .map(|slot| {
                let queue = self.queue.clone();
                let importer = Arc::clone(&self.importer);
                let runner = self.runner.clone();
                let name = format!("{}-{}", self.worker_id, slot);
                let lease_seconds = self.lease_seconds;

                tokio::spawn(async move {
                    worker_loop(slot, queue, importer, runner, name, lease_seconds).await;
                })
            })
            .collect()
    }
}

async fn worker_loop(
    slot: usize,
    queue: TaskQueue,
    importer: Arc<ImportWorker>,
    runner: TaskRunner,
    name: String,
    lease_seconds: i64,
) {
    // Only one slot reaps, on a fixed interval, to avoid hot-loop write load.
    let mut last_reap_at = Instant::now();

    loop {
        if slot == 0 && last_reap_at.elapsed() >= REAP_INTERVAL {
            match queue.reap_expired_locks().await {
                Ok(n) if n > 0 => tracing::warn!(worker = %name, reaped = n, "reaped expired task leases"),
                Ok(_) => {}
                Err(e) => tracing::error!(worker = %name, error = %e, "lease reap failed"),
            }
            last_reap_at = Instant::now();
        }

        let task = match queue.lease_one(&name, lease_seconds).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                tokio::time::sleep(IDLE_POLL).await;
                continue;
            }
            Err(e) => {
                tracing::error!(worker = %name, error = %e, "task lease failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        tracing::debug!(worker = %name, task_id = %task.id, feed_url = %task.feed_url, attempt = task.attempts, "leased task");

        match importer.run(&task.feed_url, task.attempts).await {
            Ok(_) => {
                if let Err(e) = runner.on_success(&task, &name).await {
                    tracing::error!(worker = %name, task_id = %task.id, error = %e, "failed to mark task succeeded");
                }
            }
            Err(e) => {
                tracing::warn!(worker = %name, task_id = %task.id, error = %e, "task attempt failed");
                if let Err(e) = runner.on_failure(&task, &name, &e.to_string()).await {
                    tracing::error!(worker = %name, task_id = %task.id, error = %e, "failed to apply retry policy");
                }
            }
        }
    }
}
