use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One queued feed import. `attempts` counts leases taken so far; backoff
/// state is the rescheduled `run_at`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportTask {
    pub id: Uuid,
    pub feed_url: String,
    pub status: String,
    pub run_at: DateTime<Utc>,
    pub attempts: i32,
    pub max_attempts: i32,

    pub locked_by: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
    pub lock_expires_at: Option<DateTime<Utc>>,

    pub last_error: Option<String>,
    pub dead_reason: Option<String>,
    pub dead_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub enum TaskStatus {
    Queued,
    Running,
    Succeeded,
    Dead,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Dead => "dead",
        }
    }
}
