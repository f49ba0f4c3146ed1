use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::errors::SinkError;
use crate::models::job::NormalizedJob;
use crate::sink::JobSink;

/// Postgres-backed job store. Each job is one JSONB document.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `normalized_jobs` table if it does not exist.
    pub async fn migrate(&self) -> Result<(), SinkError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS normalized_jobs (
                source_id   TEXT        NOT NULL,
                job_id      TEXT        NOT NULL,
                document    JSONB       NOT NULL,
                ingested_at TIMESTAMPTZ NOT NULL,
                updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (source_id, job_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("normalized_jobs table ready");
        Ok(())
    }

    /// Total stored jobs across all providers.
    pub async fn count(&self) -> Result<i64, SinkError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM normalized_jobs")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[async_trait]
impl JobSink for PgJobStore {
    async fn upsert(&self, job: &NormalizedJob) -> Result<(), SinkError> {
        let document = job.to_document()?;

        sqlx::query(
            r#"
            INSERT INTO normalized_jobs (source_id, job_id, document, ingested_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source_id, job_id) DO UPDATE
            SET document    = EXCLUDED.document,
                ingested_at = EXCLUDED.ingested_at,
                updated_at  = NOW()
            "#,
        )
        .bind(job.source_id())
        .bind(&job.job_id)
        .bind(&document)
        .bind(job.metadata.ingested_at)
        .execute(&self.pool)
        .await?;

        debug!("Upserted job {} for {}", job.job_id, job.source_id());
        Ok(())
    }
}
