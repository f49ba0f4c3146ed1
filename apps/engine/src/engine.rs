//! Transformation Engine: runs every configured provider through its adapter's
//! fetch-then-normalize pipeline.
//!
//! A provider failure (missing adapter, fetch error) never escapes `process_company`;
//! it becomes a `TransformationResult` with empty `data` and an `error`.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::adapters::{JobProviderAdapter, NormalizedBatch};
use crate::errors::{ConfigError, EngineError};
use crate::models::company::{CompanyConfig, SearchParams};
use crate::models::job::TransformationResult;

pub struct TransformationEngine {
    companies: Vec<CompanyConfig>,
    adapters: HashMap<String, Box<dyn JobProviderAdapter>>,
    provider_concurrency: usize,
}

impl TransformationEngine {
    pub fn new(companies: Vec<CompanyConfig>, provider_concurrency: usize) -> Self {
        Self {
            companies,
            adapters: HashMap::new(),
            provider_concurrency: provider_concurrency.max(1),
        }
    }

    pub fn with_adapters(mut self, adapters: HashMap<String, Box<dyn JobProviderAdapter>>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    pub fn register_adapter(
        &mut self,
        id: impl Into<String>,
        adapter: Box<dyn JobProviderAdapter>,
    ) {
        self.adapters.insert(id.into(), adapter);
    }

    /// Fetches and normalizes one provider. Never fails: errors are folded into the
    /// returned result.
    pub async fn process_company(
        &self,
        config: &CompanyConfig,
        params: &SearchParams,
    ) -> TransformationResult {
        info!("[{}] Processing {}", config.id, config.display_name());

        match self.run_company(config, params).await {
            Ok(batch) => {
                TransformationResult::completed(&config.id, batch.jobs, batch.failures.len())
            }
            Err(e) => {
                error!(provider = %config.id, "Provider failed: {e}");
                TransformationResult::provider_failed(&config.id, e)
            }
        }
    }

    async fn run_company(
        &self,
        config: &CompanyConfig,
        params: &SearchParams,
    ) -> Result<NormalizedBatch, EngineError> {
        let adapter = self
            .adapters
            .get(&config.id)
            .ok_or_else(|| ConfigError::AdapterMissing(config.id.clone()))?;

        let raw_jobs = adapter.search_jobs(params).await?;
        if raw_jobs.is_empty() {
            warn!("[{}] Provider returned no jobs", config.id);
        }
        Ok(adapter.normalize_batch(raw_jobs).await)
    }

    /// One result per configured provider, in configuration order.
    pub async fn process_all_companies(&self, params: &SearchParams) -> Vec<TransformationResult> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id);

        async {
            info!(
                "Processing {} companies (concurrency {})",
                self.companies.len(),
                self.provider_concurrency
            );

            let results: Vec<TransformationResult> = stream::iter(&self.companies)
                .map(|config| self.process_company(config, params))
                .buffered(self.provider_concurrency)
                .collect()
                .await;

            log_summary(&results);
            results
        }
        .instrument(span)
        .await
    }
}

fn log_summary(results: &[TransformationResult]) {
    let emitted: usize = results.iter().map(|r| r.data.len()).sum();
    let failed_records: usize = results.iter().map(|r| r.failed_records).sum();
    let failed: Vec<&str> = results
        .iter()
        .filter(|r| r.is_provider_failure())
        .map(|r| r.company_id.as_str())
        .collect();

    info!(
        providers = results.len(),
        emitted,
        failed_records,
        failed_providers = failed.len(),
        "Run complete"
    );
    if !failed.is_empty() {
        warn!("Failed providers: {}", failed.join(", "));
    }
}
