use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::SinkError;
use crate::models::job::NormalizedJob;
use crate::sink::JobSink;

type StoreKey = (String, String);

/// In-process store used when no `DATABASE_URL` is configured, and by tests.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<StoreKey, NormalizedJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    pub async fn get(&self, source_id: &str, job_id: &str) -> Option<NormalizedJob> {
        self.jobs
            .read()
            .await
            .get(&(source_id.to_string(), job_id.to_string()))
            .cloned()
    }

    /// Snapshot of every stored job, ordered by `(source_id, jobId)`.
    pub async fn jobs(&self) -> Vec<NormalizedJob> {
        let guard = self.jobs.read().await;
        let mut jobs: Vec<NormalizedJob> = guard.values().cloned().collect();
        jobs.sort_by(|a, b| {
            (a.source_id(), a.job_id.as_str()).cmp(&(b.source_id(), b.job_id.as_str()))
        });
        jobs
    }
}

#[async_trait]
impl JobSink for MemoryJobStore {
    async fn upsert(&self, job: &NormalizedJob) -> Result<(), SinkError> {
        let key = (job.source_id().to_string(), job.job_id.clone());
        self.jobs.write().await.insert(key, job.clone());
        Ok(())
    }
}
