//! Maps each [`Provider`] to the adapter that talks to it.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::AppConfig;

use super::providers::{self, LlmProvider};
use super::types::{AdapterFailure, ChatError, Provider};

/// The set of configured adapters.
///
/// Every error an adapter reports is logged here and collapsed into
/// [`AdapterFailure`] before it leaves.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Provider, Box<dyn LlmProvider>>,
}

impl AdapterRegistry {
    /// An empty registry; every query fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build adapters for every provider with credentials in `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new();
        for provider in Provider::ALL {
            match providers::create_provider(provider, config.provider_config(provider)) {
                Ok(adapter) => {
                    debug!(provider = %provider, "adapter registered");
                    registry.adapters.insert(provider, adapter);
                }
                Err(e) => warn!(provider = %provider, "adapter unavailable: {e}"),
            }
        }
        registry
    }

    /// Register or replace the adapter for `provider`.
    pub fn with(mut self, provider: Provider, adapter: Box<dyn LlmProvider>) -> Self {
        self.adapters.insert(provider, adapter);
        self
    }

    /// Whether `provider` has an adapter.
    pub fn is_configured(&self, provider: Provider) -> bool {
        self.adapters.contains_key(&provider)
    }

    /// Send `query` to `provider` and return the normalized reply.
    pub async fn query(&self, provider: Provider, query: &str) -> Result<String, AdapterFailure> {
        match self.try_query(provider, query).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!(provider = %provider, "query failed: {e}");
                Err(AdapterFailure)
            }
        }
    }

    async fn try_query(&self, provider: Provider, query: &str) -> Result<String, ChatError> {
        if query.trim().is_empty() {
            return Err(ChatError::EmptyQuery);
        }
        let adapter = self
            .adapters
            .get(&provider)
            .ok_or_else(|| ChatError::MissingApiKey(provider.to_string()))?;
        debug!(provider = adapter.name(), chars = query.len(), "dispatching query");
        adapter.ask(query).await
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("providers", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}
