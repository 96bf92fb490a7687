use std::env;

use crate::platforms::render::RENDER_API_BASE_URL;

/// Seconds a cached snapshot stays fresh unless `CACHE_TTL_SECONDS` overrides it
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Seconds before an outbound platform call is abandoned
pub const DEFAULT_PLATFORM_TIMEOUT_SECS: u64 = 30;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:1420,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Auth
    pub jwt_secret: String,

    // Base64-encoded 32-byte key for credential secrets
    pub encryption_key: String,

    // Deployment cache / platforms
    pub cache_ttl_seconds: u64,
    pub platform_timeout_seconds: u64,
    pub render_api_url: String,

    // Server
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if exists

        Ok(Self {
            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,

            // Auth
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            encryption_key: env::var("ENCRYPTION_KEY")
                .map_err(|_| ConfigError::Missing("ENCRYPTION_KEY"))?,

            // Deployment cache / platforms
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| DEFAULT_CACHE_TTL_SECS.to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("CACHE_TTL_SECONDS"))?,
            platform_timeout_seconds: env::var("PLATFORM_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| DEFAULT_PLATFORM_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PLATFORM_TIMEOUT_SECONDS"))?,
            render_api_url: env::var("RENDER_API_URL")
                .unwrap_or_else(|_| RENDER_API_BASE_URL.to_string()),

            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn platform_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.platform_timeout_seconds)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable: {0}")]
    Invalid(&'static str),
}
