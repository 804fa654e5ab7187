use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::queue::TaskQueue;

#[derive(Debug, Clone)]
pub struct TriggerSummary {
    pub queued: usize,
    pub feed_urls: Vec<String>,
}

/// Enqueues one import task per configured feed URL, on a recurring cron
/// schedule and on manual trigger.
///
/// Created stopped; `start` and `stop` are idempotent.
pub struct Scheduler {
    queue: TaskQueue,
    feed_urls: Vec<String>,
    cron_expr: String,
    inner: Mutex<Option<JobScheduler>>,
}

impl Scheduler {
    pub fn new(queue: TaskQueue, feed_urls: Vec<String>, cron_schedule: &str) -> Self {
        Self {
            queue,
            feed_urls,
            cron_expr: normalize_cron(cron_schedule),
            inner: Mutex::new(None),
        }
    }

    pub fn feed_urls(&self) -> &[String] {
        &self.feed_urls
    }

    /// Enqueue every configured feed. A failed enqueue is logged and does
    /// not stop the remaining feeds.
    pub async fn trigger_all(&self) -> TriggerSummary {
        let mut queued = 0;

        for feed_url in &self.feed_urls {
            match self.queue.enqueue(feed_url).await {
                Ok(task_id) => {
                    queued += 1;
                    tracing::info!(feed_url, task_id = %task_id, "queued feed import");
                }
                Err(e) => {
                    tracing::error!(feed_url, error = %e, "failed to queue feed import");
                }
            }
        }

        TriggerSummary {
            queued,
            feed_urls: self.feed_urls.clone(),
        }
    }

    pub async fn start(self: &Arc<Self>) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.is_some() {
            return Ok(());
        }

        tracing::info!(schedule = %self.cron_expr, feeds = self.feed_urls.len(), "starting import schedule");

        let sched = JobScheduler::new().await?;
        let this = Arc::clone(self);
        let job = Job::new_async(self.cron_expr.as_str(), move |_uuid, _lock| {
            let this = Arc::clone(&this);
            Box::pin(async move {
                tracing::info!("starting scheduled feed imports");
                let summary = this.trigger_all().await;
                tracing::info!(queued = summary.queued, "scheduled feed imports queued");
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        *inner = Some(sched);
        Ok(())
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(mut sched) = inner.take() {
            tracing::info!("stopping import schedule");
            sched.shutdown().await?;
        }
        Ok(())
    }
}

/// The scheduler parses seconds-first six-field expressions; classic
/// five-field cron gets a seconds field prepended.
fn normalize_cron(expr: &str) -> String {
    let expr = expr.trim();
    if expr.split_whitespace().count() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    }
}
