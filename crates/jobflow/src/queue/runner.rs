use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};

use crate::queue::model::ImportTask;
use crate::queue::repo::TaskQueue;
use crate::queue::retry::{next_delay_seconds, RetryConfig};

/// Applies the retry policy after each attempt of a task.
///
/// Every task-level fault here is queue infrastructure, so failures retry
/// with backoff until the attempt ceiling, then dead-letter.
#[derive(Clone)]
pub struct TaskRunner {
    queue: TaskQueue,
    retry_cfg: RetryConfig,
}

impl TaskRunner {
    pub fn new(queue: TaskQueue, retry_cfg: RetryConfig) -> Self {
        Self { queue, retry_cfg }
    }

    pub async fn on_success(&self, task: &ImportTask, worker_id: &str) -> anyhow::Result<()> {
        self.queue.mark_succeeded(task.id, worker_id).await
    }

    pub async fn on_failure(
        &self,
        task: &ImportTask,
        worker_id: &str,
        error_message: &str,
    ) -> anyhow::Result<()> {
        if task.attempts < task.max_attempts {
            let mut rng = StdRng::from_entropy();
            let delay_secs = next_delay_seconds(task.attempts, &self.retry_cfg, &mut rng);
            let next_run_at = Utc::now() + chrono::Duration::seconds(delay_secs);

            self.queue
                .reschedule_for_retry(task.id, next_run_at, error_message)
                .await
        } else {
            self.queue
                .mark_dead(task.id, worker_id, "MAX_ATTEMPTS_EXCEEDED", error_message)
                .await
        }
    }
}
