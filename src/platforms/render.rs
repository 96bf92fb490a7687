//! Render (render.com) adapter.
//!
//! Both validation and listing hit `GET /services`, which returns a JSON
//! array of `{ "service": {...}, "cursor": "..." }` entries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, Response, StatusCode};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Deployment, DeploymentStatus, Metadata};
use crate::platforms::PlatformAdapter;

pub const RENDER_API_BASE_URL: &str = "https://api.render.com/v1";
pub const RENDER_PLATFORM: &str = "render";

/// Repository URL keyword -> framework name, checked in order
const FRAMEWORK_KEYWORDS: &[(&str, &str)] = &[
    ("react", "react"),
    ("vue", "vue"),
    ("angular", "angular"),
    ("nextjs", "next.js"),
    ("nuxtjs", "nuxt.js"),
    ("gatsby", "gatsby"),
    ("svelte", "svelte"),
    ("remix", "remix"),
    ("astro", "astro"),
    ("express", "express"),
    ("nestjs", "nest.js"),
    ("flask", "flask"),
    ("django", "django"),
    ("fastapi", "fastapi"),
];

// ============ Wire types ============

#[derive(Debug, Deserialize)]
struct RenderServiceEntry {
    service: RenderService,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RenderService {
    #[serde(deserialize_with = "nullable_string")]
    id: String,
    #[serde(deserialize_with = "nullable_string")]
    name: String,
    #[serde(rename = "type", deserialize_with = "nullable_string")]
    service_type: String,
    #[serde(deserialize_with = "nullable_string")]
    branch: String,
    #[serde(deserialize_with = "nullable_string")]
    suspended: String,
    #[serde(deserialize_with = "nullable_string")]
    status: String,
    #[serde(with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    updated_at: Option<OffsetDateTime>,
    #[serde(deserialize_with = "nullable_string")]
    auto_deploy: String,
    #[serde(deserialize_with = "nullable_string")]
    repo: String,
    #[serde(deserialize_with = "nullable_string")]
    dashboard_url: String,
    service_details: Option<RenderServiceDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RenderServiceDetails {
    #[serde(deserialize_with = "nullable_string")]
    url: String,
    #[serde(deserialize_with = "nullable_string")]
    build_plan: String,
    parent_server: Option<RenderParentServer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RenderParentServer {
    #[serde(deserialize_with = "nullable_string")]
    id: String,
    #[serde(deserialize_with = "nullable_string")]
    name: String,
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ============ Adapter ============

pub struct RenderAdapter {
    client: Client,
    base_url: String,
}

impl RenderAdapter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn list_services(&self, api_key: &str) -> AppResult<Response> {
        self.client
            .get(format!("{}/services", self.base_url))
            .bearer_auth(api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::PlatformRequest(format!("Render request failed: {}", e)))
    }
}

#[async_trait]
impl PlatformAdapter for RenderAdapter {
    fn name(&self) -> &str {
        RENDER_PLATFORM
    }

    async fn validate(&self, api_key: &str) -> AppResult<()> {
        let response = self.list_services(api_key).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::InvalidPlatformCredential(RENDER_PLATFORM.to_string()));
        }
        if !status.is_success() {
            return Err(platform_error(response).await);
        }

        Ok(())
    }

    async fn fetch_deployments(&self, api_key: &str) -> AppResult<Vec<Deployment>> {
        let response = self.list_services(api_key).await?;

        if !response.status().is_success() {
            return Err(platform_error(response).await);
        }

        let entries: Vec<RenderServiceEntry> = response.json().await.map_err(|e| {
            AppError::PlatformRequest(format!("Failed to decode Render response: {}", e))
        })?;

        let now = OffsetDateTime::now_utc();
        let deployments: Vec<Deployment> = entries
            .into_iter()
            .map(|entry| to_deployment(entry.service, now))
            .collect();

        tracing::debug!(
            platform = RENDER_PLATFORM,
            deployments_count = deployments.len(),
            "Fetched Render services"
        );

        Ok(deployments)
    }
}

async fn platform_error(response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    AppError::Platform { status, body }
}

// ============ Mapping ============

/// Case-insensitive Render status -> normalized status
pub fn map_status(status: &str) -> DeploymentStatus {
    match status.to_lowercase().as_str() {
        "live" | "up" => DeploymentStatus::Live,
        "suspended" => DeploymentStatus::Canceled,
        "deploying" | "build" => DeploymentStatus::Deploying,
        "failed" | "error" => DeploymentStatus::Failed,
        _ => DeploymentStatus::Unknown,
    }
}

/// Guess the framework from the repository URL; empty when nothing matches
pub fn infer_framework(repo_url: &str) -> String {
    if repo_url.is_empty() {
        return String::new();
    }

    let repo_url = repo_url.to_lowercase();
    FRAMEWORK_KEYWORDS
        .iter()
        .find(|(keyword, _)| repo_url.contains(keyword))
        .map(|(_, framework)| framework.to_string())
        .unwrap_or_default()
}

fn rfc3339_or_null(value: Option<OffsetDateTime>) -> Value {
    value
        .and_then(|t| t.format(&Rfc3339).ok())
        .map(Value::String)
        .unwrap_or(Value::Null)
}

fn to_deployment(service: RenderService, now: OffsetDateTime) -> Deployment {
    let details = service.service_details.unwrap_or_default();

    let mut metadata = Metadata::new();
    metadata.insert("type".to_string(), json!(service.service_type));
    metadata.insert("autoDeploy".to_string(), json!(service.auto_deploy));
    metadata.insert("suspended".to_string(), json!(service.suspended));
    metadata.insert("createdAt".to_string(), rfc3339_or_null(service.created_at));
    metadata.insert("updatedAt".to_string(), rfc3339_or_null(service.updated_at));
    metadata.insert("repo".to_string(), json!(service.repo));
    metadata.insert("dashboardUrl".to_string(), json!(service.dashboard_url));
    metadata.insert("buildPlan".to_string(), json!(details.build_plan));
    if let Some(parent) = &details.parent_server {
        metadata.insert("parentServerId".to_string(), json!(parent.id));
        metadata.insert("parentServerName".to_string(), json!(parent.name));
    }

    // Render does not report a deploy time; approximate it from updatedAt
    let last_deployed_at = if service.status == "live" || service.created_at != service.updated_at
    {
        service.updated_at
    } else {
        None
    };

    Deployment {
        status: map_status(&service.status),
        framework: infer_framework(&service.repo),
        id: service.id,
        platform_credential_id: Uuid::nil(),
        name: service.name,
        url: details.url,
        last_deployed_at,
        branch: service.branch,
        service_type: service.service_type,
        last_updated_at: service.updated_at.unwrap_or(now),
        metadata,
    }
}
