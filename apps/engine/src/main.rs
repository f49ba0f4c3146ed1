use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use engine::adapters::{AdapterDeps, AdapterFactory};
use engine::config::{Config, TransformerBackend};
use engine::db::{create_pool, pool_size};
use engine::engine::TransformationEngine;
use engine::llm_client::LlmClient;
use engine::models::company::SearchParams;
use engine::registry::Registry;
use engine::sink::{export, JobSink, MemoryJobStore, PgJobStore};
use engine::transform::{LlmTransformer, MockTransformer, TransformationStep, Transformer};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting transformation engine v{}", env!("CARGO_PKG_VERSION"));

    // Company registry, with per-provider URL overrides
    let mut registry = match &config.companies_config {
        Some(path) => Registry::from_path(path)?,
        None => Registry::builtin()?,
    };
    registry.apply_env_overrides(|key| std::env::var(key).ok());

    // Document store: Postgres when configured, in-process otherwise
    let pg_store = match &config.database_url {
        Some(url) => {
            let max_connections = pool_size(config.provider_concurrency, config.record_concurrency);
            let store = PgJobStore::new(create_pool(url, max_connections).await?);
            store.migrate().await.context("Failed to prepare normalized_jobs table")?;
            Some(store)
        }
        None => {
            warn!("DATABASE_URL not set; jobs are kept in memory and only exported to JSONL");
            None
        }
    };
    let sink: Arc<dyn JobSink> = match &pg_store {
        Some(store) => Arc::new(store.clone()),
        None => Arc::new(MemoryJobStore::new()),
    };

    let transformer: Arc<dyn Transformer> = match config.transformer {
        TransformerBackend::Llm => {
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is required for TRANSFORMER=llm")?;
            let llm = LlmClient::new(api_key)?;
            info!("LLM client initialized (model: {})", llm.model());
            Arc::new(LlmTransformer::new(llm))
        }
        TransformerBackend::Mock => {
            warn!("Using mock transformer; output is not model-normalized");
            Arc::new(MockTransformer)
        }
    };

    let http = reqwest::Client::builder()
        .timeout(config.fetch_timeout)
        .build()
        .context("Failed to build provider HTTP client")?;

    let step = TransformationStep::new(transformer, config.transform_timeout);
    info!(
        "Transformation backend: {} (timeout {:?})",
        step.backend_name(),
        config.transform_timeout
    );

    let deps = AdapterDeps {
        step: Arc::new(step),
        sink,
        normalized_schema: Some(registry.normalized().schema.clone()),
        http,
        record_concurrency: config.record_concurrency,
    };

    let factory = AdapterFactory::new(deps);
    let adapters = factory.create_all_adapters(registry.companies());
    let engine =
        TransformationEngine::new(registry.companies().to_vec(), config.provider_concurrency)
            .with_adapters(adapters);

    let results = engine.process_all_companies(&SearchParams::new()).await;

    let written = export::write_jsonl(&config.output_path, &results)?;
    info!(
        "Exported {written} jobs from {} companies to {}",
        results.len(),
        config.output_path.display()
    );
    if let Some(store) = &pg_store {
        info!("normalized_jobs now holds {} jobs", store.count().await?);
    }

    Ok(())
}
