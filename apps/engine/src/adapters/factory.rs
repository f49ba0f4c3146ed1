use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use crate::adapters::{AdapterDeps, GenericAdapter, JobProviderAdapter};
use crate::errors::ConfigError;
use crate::models::company::CompanyConfig;

/// Builds a specialized adapter for one provider.
pub type AdapterBuilder = Arc<
    dyn Fn(CompanyConfig, AdapterDeps) -> Result<Box<dyn JobProviderAdapter>, ConfigError>
        + Send
        + Sync,
>;

/// Resolves provider ids to adapters. Providers without a registered builder get the
/// [`GenericAdapter`].
pub struct AdapterFactory {
    builders: HashMap<String, AdapterBuilder>,
    deps: AdapterDeps,
}

impl AdapterFactory {
    pub fn new(deps: AdapterDeps) -> Self {
        Self {
            builders: HashMap::new(),
            deps,
        }
    }

    /// Plugs in a specialized adapter for `id`, replacing any earlier registration.
    pub fn register_adapter<F>(&mut self, id: impl Into<String>, builder: F)
    where
        F: Fn(CompanyConfig, AdapterDeps) -> Result<Box<dyn JobProviderAdapter>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        let id = id.into();
        info!("Registered adapter for {id}");
        self.builders.insert(id, Arc::new(builder));
    }

    /// Ids with a specialized adapter, sorted.
    pub fn registered_adapters(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn create_adapter(
        &self,
        config: &CompanyConfig,
    ) -> Result<Box<dyn JobProviderAdapter>, ConfigError> {
        let adapter: Box<dyn JobProviderAdapter> = match self.builders.get(&config.id) {
            Some(build) => build(config.clone(), self.deps.clone())?,
            None => Box::new(GenericAdapter::new(config.clone(), self.deps.clone())?),
        };

        if adapter.provider_id() != config.id {
            return Err(ConfigError::ProviderMismatch {
                expected: config.id.clone(),
                actual: adapter.provider_id().to_string(),
            });
        }
        Ok(adapter)
    }

    /// One adapter per config. A provider whose adapter cannot be built is logged and
    /// left out; the engine later reports it as unresolvable.
    pub fn create_all_adapters(
        &self,
        configs: &[CompanyConfig],
    ) -> HashMap<String, Box<dyn JobProviderAdapter>> {
        let mut adapters = HashMap::with_capacity(configs.len());
        for config in configs {
            match self.create_adapter(config) {
                Ok(adapter) => {
                    info!("[{}] Using {} adapter", config.id, adapter.kind());
                    adapters.insert(config.id.clone(), adapter);
                }
                Err(e) => error!("[{}] Failed to create adapter: {e}", config.id),
            }
        }
        adapters
    }
}
