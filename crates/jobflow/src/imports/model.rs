use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One item that could not be imported during a run. `item` is the raw
/// payload when the failure was per-item, absent when the whole fetch
/// failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedJob {
    pub reason: String,
    pub item: Option<Value>,
}

/// Summary of one pipeline invocation for one feed URL.
///
/// On the normal path `total_fetched == new_jobs + updated_jobs +
/// failed_jobs.len()` and `total_imported == new_jobs + updated_jobs`; a
/// top-level fetch/parse failure degenerates to zero counters and a single
/// item-less failure entry. `attempt` is the queue attempt that produced
/// this run, so retries stay distinguishable.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRun {
    pub feed_url: String,
    pub attempt: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_fetched: i32,
    pub total_imported: i32,
    pub new_jobs: i32,
    pub updated_jobs: i32,
    pub failed_jobs: Vec<FailedJob>,
}
