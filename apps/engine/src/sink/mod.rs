//! Document-store sinks for normalized jobs.
//!
//! Writes are upserts keyed by `(metadata.source_id, jobId)`: re-ingesting the same
//! provider record replaces the stored document instead of duplicating it.

use async_trait::async_trait;

use crate::errors::SinkError;
use crate::models::job::NormalizedJob;

pub mod export;
pub mod memory;
pub mod postgres;

pub use memory::MemoryJobStore;
pub use postgres::PgJobStore;

#[async_trait]
pub trait JobSink: Send + Sync {
    async fn upsert(&self, job: &NormalizedJob) -> Result<(), SinkError>;
}
