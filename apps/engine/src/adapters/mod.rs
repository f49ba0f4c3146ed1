//! Provider adapters: fetch raw records from one provider and normalize them through
//! the Transformation Step.
//!
//! Pluggable behind [`JobProviderAdapter`] (`Box<dyn JobProviderAdapter>`). The
//! [`GenericAdapter`] is driven entirely by a `CompanyConfig`; specialized adapters are
//! plugged in through [`AdapterFactory::register_adapter`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::FetchError;
use crate::models::company::SearchParams;
use crate::models::job::{NormalizedJob, RawJob, RecordFailure};
use crate::sink::JobSink;
use crate::transform::TransformationStep;

pub mod factory;
pub mod fetch;
pub mod generic;

pub use factory::{AdapterBuilder, AdapterFactory};
pub use generic::GenericAdapter;

/// Outcome of normalizing one fetched batch. `jobs` keeps input order; its length
/// plus `failures.len()` equals the batch size.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub jobs: Vec<NormalizedJob>,
    pub failures: Vec<RecordFailure>,
}

#[async_trait]
pub trait JobProviderAdapter: Send + Sync {
    fn provider_id(&self) -> &str;

    /// `"generic"` for the config-driven fallback.
    fn kind(&self) -> &'static str;

    /// Fetches the provider's raw records. Never returns a partial list.
    async fn search_jobs(&self, params: &SearchParams) -> Result<Vec<RawJob>, FetchError>;

    /// Transforms and persists each record independently. A failing record lands in
    /// `failures` and never aborts the batch.
    async fn normalize_batch(&self, raw_jobs: Vec<RawJob>) -> NormalizedBatch;

    async fn normalize_jobs(&self, raw_jobs: Vec<RawJob>) -> Vec<NormalizedJob> {
        self.normalize_batch(raw_jobs).await.jobs
    }
}

/// Collaborators shared by every adapter built in one run.
#[derive(Clone)]
pub struct AdapterDeps {
    pub step: Arc<TransformationStep>,
    pub sink: Arc<dyn JobSink>,
    /// Target schema for providers without their own override.
    pub normalized_schema: Option<Value>,
    pub http: reqwest::Client,
    pub record_concurrency: usize,
}
