pub mod render;

pub use render::RenderAdapter;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::Deployment;

/// Capability every supported deployment platform provides.
///
/// Implementations receive the decrypted API key for one call and must not
/// retain it. Errors follow the platform taxonomy of `AppError`:
/// `InvalidPlatformCredential` for a rejected key, `Platform` for any other
/// non-success response and `PlatformRequest` for transport or decode
/// failures.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Registry key for this platform (lower-case)
    fn name(&self) -> &str;

    /// Make a lightweight authenticated call to check the key
    async fn validate(&self, api_key: &str) -> AppResult<()>;

    /// Fetch and normalize every deployment visible to the key.
    /// `platform_credential_id` on the returned records is left nil; the
    /// cache tags them with the owning credential.
    async fn fetch_deployments(&self, api_key: &str) -> AppResult<Vec<Deployment>>;
}

/// Lookup table from platform name to adapter
#[derive(Clone, Default)]
pub struct PlatformRegistry {
    adapters: HashMap<String, Arc<dyn PlatformAdapter>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adapter configured from `config`
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(RenderAdapter::new(
            config.render_api_url.clone(),
            config.platform_timeout(),
        )?));
        Ok(registry)
    }

    /// Add or replace the adapter for `adapter.name()`
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) {
        self.adapters
            .insert(adapter.name().to_ascii_lowercase(), adapter);
    }

    pub fn get(&self, platform: &str) -> AppResult<Arc<dyn PlatformAdapter>> {
        self.adapters
            .get(&platform.trim().to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| AppError::UnsupportedPlatform(platform.to_string()))
    }

    pub fn supports(&self, platform: &str) -> bool {
        self.adapters
            .contains_key(&platform.trim().to_ascii_lowercase())
    }

    /// Registered platform names, sorted
    pub fn platforms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.adapters.keys().cloned().collect();
        names.sort();
        names
    }
}
