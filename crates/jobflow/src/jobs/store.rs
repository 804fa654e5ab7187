use sqlx::PgPool;
use thiserror::Error;

use crate::feed::FeedItem;
use crate::jobs::model::JobRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    New,
    Updated,
}

#[derive(Debug, Error)]
pub enum UpsertError {
    #[error("item has no derivable external id")]
    MissingExternalId,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct JobStore {
    pool: PgPool,
}

impl JobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert-or-update keyed by external id, advancing `last_seen_at`.
    ///
    /// Concurrent upserts racing on the same id resolve last-write-wins
    /// under the unique constraint. `xmax = 0` holds only for rows created
    /// by this statement.
    pub async fn upsert(&self, item: &FeedItem) -> Result<UpsertOutcome, UpsertError> {
        let external_id = item
            .external_id
            .as_deref()
            .ok_or(UpsertError::MissingExternalId)?;

        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO jobs (external_id, title, company, location, description, url, raw)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (external_id) DO UPDATE
            SET title = EXCLUDED.title,
                company = EXCLUDED.company,
                location = EXCLUDED.location,
                description = EXCLUDED.description,
                url = EXCLUDED.url,
                raw = EXCLUDED.raw,
                last_seen_at = now(),
                updated_at = now()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(external_id)
        .bind(&item.title)
        .bind(&item.company)
        .bind(&item.location)
        .bind(&item.description)
        .bind(&item.url)
        .bind(&item.raw)
        .fetch_one(&self.pool)
        .await?;

        Ok(if inserted {
            UpsertOutcome::New
        } else {
            UpsertOutcome::Updated
        })
    }

    pub async fn count_jobs(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> anyhow::Result<Option<JobRecord>> {
        let record = sqlx::query_as::<_, JobRecord>("SELECT * FROM jobs WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }
}
