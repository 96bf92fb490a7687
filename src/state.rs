use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::db;
use crate::platforms::PlatformRegistry;
use crate::services::{Aggregator, DeploymentCache, SecretCipher};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// SeaORM database connection
    pub db: DatabaseConnection,
    pub config: Config,
    /// Seals credential secrets at rest
    pub cipher: Arc<SecretCipher>,
    /// Adapters for every supported deployment platform
    pub platforms: Arc<PlatformRegistry>,
}

impl AppState {
    /// Create a new AppState: connect, migrate and register the built-in platforms
    pub async fn new(config: Config) -> Result<Self, AppStateError> {
        let db = db::connect(&config.database_url)
            .await
            .map_err(|e| AppStateError::Database(e.to_string()))?;

        db::migrate(&db)
            .await
            .map_err(|e| AppStateError::Migration(e.to_string()))?;

        let platforms = PlatformRegistry::from_config(&config)
            .map_err(|e| AppStateError::Platform(e.to_string()))?;

        Self::with_platforms(db, config, platforms)
    }

    /// Create AppState over an existing connection and a custom registry (for testing)
    pub fn with_platforms(
        db: DatabaseConnection,
        config: Config,
        platforms: PlatformRegistry,
    ) -> Result<Self, AppStateError> {
        let cipher = SecretCipher::from_base64_key(&config.encryption_key)
            .map_err(|e| AppStateError::EncryptionKey(e.to_string()))?;

        Ok(Self {
            db,
            config,
            cipher: Arc::new(cipher),
            platforms: Arc::new(platforms),
        })
    }

    pub fn deployment_cache(&self) -> DeploymentCache {
        DeploymentCache::new(
            self.db.clone(),
            self.platforms.clone(),
            self.config.cache_ttl(),
        )
    }

    pub fn aggregator(&self) -> Aggregator {
        Aggregator::new(self.db.clone(), self.cipher.clone(), self.deployment_cache())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("Database connection error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Invalid ENCRYPTION_KEY: {0}")]
    EncryptionKey(String),

    #[error("Platform client error: {0}")]
    Platform(String),
}
