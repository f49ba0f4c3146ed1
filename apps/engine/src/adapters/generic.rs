use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::adapters::fetch::fetch_raw_jobs;
use crate::adapters::{AdapterDeps, JobProviderAdapter, NormalizedBatch};
use crate::errors::{ConfigError, FetchError};
use crate::models::company::{CompanyConfig, SearchParams};
use crate::models::job::{record_key, FailureStage, NormalizedJob, RawJob, RecordFailure};
use crate::transform::CompiledSchema;

/// Config-driven adapter used for every provider without a specialized one.
pub struct GenericAdapter {
    config: CompanyConfig,
    raw_schema: CompiledSchema,
    target_schema: CompiledSchema,
    deps: AdapterDeps,
}

impl GenericAdapter {
    pub const KIND: &'static str = "generic";

    /// Compiles both schemas up front. The target is the provider's override, else the
    /// shared normalized schema, else the raw schema itself.
    pub fn new(config: CompanyConfig, deps: AdapterDeps) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidCompany {
            id: config.id.clone(),
            reason,
        };

        let raw_schema = CompiledSchema::compile(&config.search.schema)
            .map_err(|e| invalid(format!("search.schema: {e}")))?;
        let target = config.search.target_schema(deps.normalized_schema.as_ref());
        let target_schema = CompiledSchema::compile(target)
            .map_err(|e| invalid(format!("target schema: {e}")))?;

        Ok(Self {
            config,
            raw_schema,
            target_schema,
            deps,
        })
    }

    async fn normalize_one(
        &self,
        index: usize,
        raw: RawJob,
    ) -> Result<NormalizedJob, RecordFailure> {
        let provider = self.config.id.as_str();
        let key = record_key(&raw);
        let fail = |stage: FailureStage, reason: String| {
            warn!(
                provider,
                index,
                record_key = key.as_deref().unwrap_or("-"),
                %stage,
                "Failed to normalize job: {reason}"
            );
            debug!(provider, index, raw = %raw, "Rejected raw record");
            RecordFailure {
                index,
                record_key: key.clone(),
                stage,
                reason,
            }
        };

        if let Err(errors) = self.raw_schema.validate(&raw) {
            warn!(
                provider,
                index,
                record_key = key.as_deref().unwrap_or("-"),
                "Raw record does not match the provider schema: {}",
                errors.join("; ")
            );
        }

        let transformed = match self
            .deps
            .step
            .apply(&raw, &self.raw_schema, &self.target_schema)
            .await
        {
            Ok(document) => document,
            Err(e) => return Err(fail(e.stage(), e.to_string())),
        };

        let job = NormalizedJob::new(provider, transformed, raw.clone());
        if let Err(e) = self.deps.sink.upsert(&job).await {
            return Err(fail(FailureStage::Persist, e.to_string()));
        }

        debug!(provider, job_id = %job.job_id, "Normalized job");
        Ok(job)
    }
}

#[async_trait]
impl JobProviderAdapter for GenericAdapter {
    fn provider_id(&self) -> &str {
        &self.config.id
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    async fn search_jobs(&self, params: &SearchParams) -> Result<Vec<RawJob>, FetchError> {
        fetch_raw_jobs(&self.deps.http, &self.config.id, &self.config.search, params).await
    }

    async fn normalize_batch(&self, raw_jobs: Vec<RawJob>) -> NormalizedBatch {
        let total = raw_jobs.len();
        let outcomes: Vec<Result<NormalizedJob, RecordFailure>> = stream::iter(raw_jobs)
            .enumerate()
            .map(|(index, raw)| self.normalize_one(index, raw))
            .buffered(self.deps.record_concurrency.max(1))
            .collect()
            .await;

        let mut batch = NormalizedBatch::default();
        for outcome in outcomes {
            match outcome {
                Ok(job) => batch.jobs.push(job),
                Err(failure) => batch.failures.push(failure),
            }
        }

        info!(
            "[{}] Normalized {}/{} jobs ({} failed)",
            self.config.id,
            batch.jobs.len(),
            total,
            batch.failures.len()
        );
        batch
    }
}
