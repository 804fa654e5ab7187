use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::queue::model::{ImportTask, TaskStatus};

#[derive(Clone)]
pub struct TaskQueue {
    pool: PgPool,
    max_attempts: i32,
}

impl TaskQueue {
    pub fn new(pool: PgPool, max_attempts: i32) -> Self {
        Self {
            pool,
            max_attempts: max_attempts.max(1),
        }
    }

    // ----------------------------
    // Enqueue
    // ----------------------------

    pub async fn enqueue(&self, feed_url: &str) -> anyhow::Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO import_tasks (feed_url, status, run_at, max_attempts)
            VALUES ($1, $2, now(), $3)
            RETURNING id
            "#,
        )
        .bind(feed_url)
        .bind(TaskStatus::Queued.as_str())
        .bind(self.max_attempts)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    // ----------------------------
    // Leasing
    // ----------------------------

    /// Lease exactly one runnable task for this worker, incrementing its
    /// attempt count. `FOR UPDATE SKIP LOCKED` keeps concurrent workers off
    /// each other's candidates.
    pub async fn lease_one(
        &self,
        worker_id: &str,
        lease_seconds: i64,
    ) -> anyhow::Result<Option<ImportTask>> {
        let task = sqlx::query_as::<_, ImportTask>(
            r#"
            UPDATE import_tasks
            SET status = 'running',
                attempts = attempts + 1,
                locked_by = $1,
                locked_at = now(),
                lock_expires_at = now() + ($2::int * interval '1 second'),
                updated_at = now()
            WHERE id = (
                SELECT id
                FROM import_tasks
                WHERE status = 'queued'
                  AND run_at <= now()
                ORDER BY run_at ASC, created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(worker_id)
        .bind(lease_seconds)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    // ----------------------------
    // State transitions
    // ----------------------------

    pub async fn mark_succeeded(&self, task_id: Uuid, worker_id: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE import_tasks
            SET status = 'succeeded',
                locked_by = NULL,
                locked_at = NULL,
                lock_expires_at = NULL,
                updated_at = now()
            WHERE id = $1
              AND locked_by = $2
            "#,
        )
        .bind(task_id)
        .bind(worker_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn reschedule_for_retry(
        &self,
        task_id: Uuid,
        next_run_at: DateTime<Utc>,
        last_error: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE import_tasks
            SET status = 'queued',
                run_at = $2,
                locked_by = NULL,
                locked_at = NULL,
                lock_expires_at = NULL,
                last_error = $3,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(task_id)
        .bind(next_run_at)
        .bind(last_error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_dead(
        &self,
        task_id: Uuid,
        worker_id: &str,
        reason: &str,
        last_error: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE import_tasks
            SET status = 'dead',
                dead_reason = $3,
                dead_at = now(),
                locked_by = NULL,
                locked_at = NULL,
                lock_expires_at = NULL,
                last_error = $4,
                updated_at = now()
            WHERE id = $1
              AND locked_by = $2
            "#,
        )
        .bind(task_id)
        .bind(worker_id)
        .bind(reason)
        .bind(last_error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ----------------------------
    // Maintenance / reads
    // ----------------------------

    /// Return tasks whose lease expired to the queue, so work from a dead
    /// worker is re-delivered.
    pub async fn reap_expired_locks(&self) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE import_tasks
            SET status = 'queued',
                locked_by = NULL,
                locked_at = NULL,
                lock_expires_at = NULL,
                updated_at = now()
            WHERE status = 'running'
              AND lock_expires_at IS NOT NULL
              AND lock_expires_at < now()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }

    pub async fn get_task(&self, task_id: Uuid) -> anyhow::Result<Option<ImportTask>> {
        let task = sqlx::query_as::<_, ImportTask>("SELECT * FROM import_tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    /// Returns (queued, running, dead) counts for the stats surface.
    pub async fn depth(&self) -> anyhow::Result<(i64, i64, i64)> {
        let queued: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM import_tasks WHERE status = 'queued'")
                .fetch_one(&self.pool)
                .await?;
        let running: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM import_tasks WHERE status = 'running'")
                .fetch_one(&self.pool)
                .await?;
        let dead: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM import_tasks WHERE status = 'dead'")
                .fetch_one(&self.pool)
                .await?;

        Ok((queued, running, dead))
    }
}
