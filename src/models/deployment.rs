use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Platform-specific key/value bag attached to every deployment
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Closed set of states a platform service is normalized into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Live,
    Deploying,
    Canceled,
    Failed,
    Unknown,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Live => "live",
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Canceled => "canceled",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Unknown => "unknown",
        }
    }

    /// Parse a value written by `as_str`; anything else reads back as `Unknown`
    pub fn from_stored(value: &str) -> Self {
        match value {
            "live" => DeploymentStatus::Live,
            "deploying" => DeploymentStatus::Deploying,
            "canceled" => DeploymentStatus::Canceled,
            "failed" => DeploymentStatus::Failed,
            _ => DeploymentStatus::Unknown,
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized deployment record. Identity is (`id`, `platform_credential_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Deployment {
    pub id: String,
    pub platform_credential_id: Uuid,
    pub name: String,
    pub status: DeploymentStatus,
    pub url: String,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub last_deployed_at: Option<OffsetDateTime>,
    pub branch: String,
    pub service_type: String,
    /// Empty when nothing could be inferred
    pub framework: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub last_updated_at: OffsetDateTime,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
}
