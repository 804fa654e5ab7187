use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::imports::model::ImportRun;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ImportRunRow {
    pub id: Uuid,
    pub feed_url: String,
    pub attempt: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_fetched: i32,
    pub total_imported: i32,
    pub new_jobs: i32,
    pub updated_jobs: i32,
    pub failed_jobs: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct RunLogRepo {
    pool: PgPool,
}

impl RunLogRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one run record. Rows are never updated or deleted here;
    /// retention is an external concern.
    pub async fn persist(&self, run: &ImportRun) -> anyhow::Result<Uuid> {
        let failed_jobs = serde_json::to_value(&run.failed_jobs)?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO import_runs (
                feed_url, attempt, started_at, finished_at,
                total_fetched, total_imported, new_jobs, updated_jobs,
                failed_jobs
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&run.feed_url)
        .bind(run.attempt)
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(run.total_fetched)
        .bind(run.total_imported)
        .bind(run.new_jobs)
        .bind(run.updated_jobs)
        .bind(failed_jobs)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn list_recent(&self, limit: i64) -> anyhow::Result<Vec<ImportRunRow>> {
        let limit = limit.clamp(1, 500);

        let rows = sqlx::query_as::<_, ImportRunRow>(
            r#"
            SELECT *
            FROM import_runs
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn most_recent(&self) -> anyhow::Result<Option<ImportRunRow>> {
        let row = sqlx::query_as::<_, ImportRunRow>(
            r#"
            SELECT *
            FROM import_runs
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
