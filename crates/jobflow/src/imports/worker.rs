use chrono::Utc;
use std::sync::Arc;

use crate::feed::{normalize, FeedSource};
use crate::imports::model::{FailedJob, ImportRun};
use crate::imports::run_log::RunLogRepo;
use crate::jobs::{JobStore, UpsertOutcome};

/// Orchestrates one feed import: fetch, normalize and upsert each item,
/// then persist the run summary. This is the body of one queue task.
pub struct ImportWorker {
    feed: Arc<dyn FeedSource>,
    store: JobStore,
    run_log: RunLogRepo,
}

impl ImportWorker {
    pub fn new(feed: Arc<dyn FeedSource>, store: JobStore, run_log: RunLogRepo) -> Self {
        Self {
            feed,
            store,
            run_log,
        }
    }

    /// Process one feed URL end to end and return the run summary.
    ///
    /// All pipeline failure is reduced to run data: a fetch/parse failure
    /// degenerates the run to a single item-less failure entry, per-item
    /// failures are recorded without aborting the loop, and a failed
    /// summary save is logged and swallowed. The `Err` arm is reserved for
    /// queue infrastructure faults, which the task queue retries.
    pub async fn run(&self, feed_url: &str, attempt: i32) -> anyhow::Result<ImportRun> {
        let started_at = Utc::now();

        let mut total_fetched = 0;
        let mut total_imported = 0;
        let mut new_jobs = 0;
        let mut updated_jobs = 0;
        let mut failed_jobs: Vec<FailedJob> = Vec::new();

        match self.feed.fetch_items(feed_url).await {
            Ok(raw_items) => {
                total_fetched = raw_items.len() as i32;

                for raw in &raw_items {
                    let item = normalize(raw);
                    match self.store.upsert(&item).await {
                        Ok(UpsertOutcome::New) => {
                            new_jobs += 1;
                            total_imported += 1;
                        }
                        Ok(UpsertOutcome::Updated) => {
                            updated_jobs += 1;
                            total_imported += 1;
                        }
                        Err(e) => failed_jobs.push(FailedJob {
                            reason: e.to_string(),
                            item: Some(raw.clone()),
                        }),
                    }
                }
            }
            Err(e) => failed_jobs.push(FailedJob {
                reason: format!("Fetch/Parse error: {e}"),
                item: None,
            }),
        }

        let run = ImportRun {
            feed_url: feed_url.to_string(),
            attempt,
            started_at,
            finished_at: Utc::now(),
            total_fetched,
            total_imported,
            new_jobs,
            updated_jobs,
            failed_jobs,
        };

        if let Err(e) = self.run_log.persist(&run).await {
            tracing::error!(feed_url, error = %e, "failed to save import run");
        }

        tracing::info!(
            feed_url,
            attempt,
            fetched = run.total_fetched,
            imported = run.total_imported,
            new = run.new_jobs,
            updated = run.updated_jobs,
            failed = run.failed_jobs.len(),
            "feed processed"
        );

        Ok(run)
    }
}
