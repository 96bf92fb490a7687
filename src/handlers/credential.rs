use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{validate_optional, validate_required};
use crate::middlewares::AuthUser;
use crate::models::{normalize_platform, CreateCredential, Credential, Deployment, UpdateCredential};
use crate::repositories::{CredentialRepository, UserRepository};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCredentialRequest {
    pub platform: String,
    /// Defaults to the platform name
    pub name: Option<String>,
    pub api_key: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCredentialRequest {
    pub platform: Option<String>,
    pub name: Option<String>,
    pub api_key: Option<String>,
}

/// Credential as returned to clients; the secret never leaves the server
#[derive(Debug, Serialize, ToSchema)]
pub struct CredentialResponse {
    pub id: Uuid,
    pub user_id: String,
    pub platform: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub updated_at: OffsetDateTime,
}

impl From<Credential> for CredentialResponse {
    fn from(c: Credential) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            platform: c.platform,
            name: c.name,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CredentialListResponse {
    pub credentials: Vec<CredentialResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CredentialDeploymentsResponse {
    pub deployments: Vec<Deployment>,
}

// ============ Handlers ============

/// Register a platform API key after checking it against the platform
#[utoipa::path(
    post,
    path = "/api/credentials",
    request_body = CreateCredentialRequest,
    responses(
        (status = 201, description = "Credential created successfully", body = CredentialResponse),
        (status = 400, description = "Validation error, unsupported platform or rejected key"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Platform unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Credentials"
)]
pub async fn create_credential(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCredentialRequest>,
) -> AppResult<(StatusCode, Json<CredentialResponse>)> {
    validate_required(&payload.platform, "Platform")?;
    validate_required(&payload.api_key, "API key")?;

    let platform = normalize_platform(&payload.platform);
    let api_key = payload.api_key.trim().to_string();

    state.platforms.get(&platform)?.validate(&api_key).await?;

    UserRepository::find_or_create(
        &state.db,
        &user.id,
        user.email.as_deref(),
        user.name.as_deref(),
    )
    .await?;

    let name = payload
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| platform.clone());

    let input = CreateCredential {
        platform,
        name,
        api_key,
    };
    let credential = CredentialRepository::create(&state.db, &state.cipher, &user.id, &input).await?;

    info!(
        user_id = %user.id,
        credential_id = %credential.id,
        platform = %credential.platform,
        "Created credential"
    );

    Ok((StatusCode::CREATED, Json(credential.into())))
}

/// List all credentials of the current user
#[utoipa::path(
    get,
    path = "/api/credentials",
    responses(
        (status = 200, description = "List of credentials", body = CredentialListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Credentials"
)]
pub async fn list_credentials(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<CredentialListResponse>> {
    let credentials = CredentialRepository::list_by_owner(&state.db, &state.cipher, &user.id).await?;

    Ok(Json(CredentialListResponse {
        credentials: credentials.into_iter().map(|c| c.into()).collect(),
    }))
}

/// Get a credential by ID
#[utoipa::path(
    get,
    path = "/api/credentials/{id}",
    params(
        ("id" = Uuid, Path, description = "Credential ID")
    ),
    responses(
        (status = 200, description = "Credential details", body = CredentialResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Credential not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Credentials"
)]
pub async fn get_credential(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CredentialResponse>> {
    let credential =
        CredentialRepository::find_by_id_and_owner(&state.db, &state.cipher, id, &user.id).await?;
    Ok(Json(credential.into()))
}

/// Update a credential; a new platform or key is checked first
#[utoipa::path(
    put,
    path = "/api/credentials/{id}",
    params(
        ("id" = Uuid, Path, description = "Credential ID")
    ),
    request_body = UpdateCredentialRequest,
    responses(
        (status = 200, description = "Credential updated successfully", body = CredentialResponse),
        (status = 400, description = "Validation error, unsupported platform or rejected key"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Credential not found"),
        (status = 502, description = "Platform unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Credentials"
)]
pub async fn update_credential(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCredentialRequest>,
) -> AppResult<Json<CredentialResponse>> {
    validate_optional(payload.platform.as_deref(), "Platform")?;
    validate_optional(payload.name.as_deref(), "Name")?;
    validate_optional(payload.api_key.as_deref(), "API key")?;

    let existing =
        CredentialRepository::find_by_id_and_owner(&state.db, &state.cipher, id, &user.id).await?;

    let api_key = payload.api_key.as_deref().map(str::trim);
    if payload.platform.is_some() || api_key.is_some() {
        let platform = payload
            .platform
            .as_deref()
            .map(normalize_platform)
            .unwrap_or_else(|| existing.platform.clone());
        state
            .platforms
            .get(&platform)?
            .validate(api_key.unwrap_or(&existing.api_key))
            .await?;
    }

    let input = UpdateCredential {
        platform: payload.platform,
        name: payload.name,
        api_key: api_key.map(String::from),
    };
    let credential =
        CredentialRepository::update(&state.db, &state.cipher, id, &user.id, &input).await?;

    state.deployment_cache().invalidate(id).await?;

    info!(user_id = %user.id, credential_id = %id, "Updated credential");

    Ok(Json(credential.into()))
}

/// Delete a credential and its cached deployments
#[utoipa::path(
    delete,
    path = "/api/credentials/{id}",
    params(
        ("id" = Uuid, Path, description = "Credential ID")
    ),
    responses(
        (status = 204, description = "Credential deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Credential not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Credentials"
)]
pub async fn delete_credential(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    CredentialRepository::delete_by_owner(&state.db, id, &user.id).await?;
    info!(user_id = %user.id, credential_id = %id, "Deleted credential");
    Ok(StatusCode::NO_CONTENT)
}

/// Deployments of one credential, served from cache while fresh
#[utoipa::path(
    get,
    path = "/api/credentials/{id}/deployments",
    params(
        ("id" = Uuid, Path, description = "Credential ID")
    ),
    responses(
        (status = 200, description = "Deployments for the credential", body = CredentialDeploymentsResponse),
        (status = 400, description = "Unsupported platform or rejected key"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Credential not found"),
        (status = 502, description = "Platform unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Credentials"
)]
pub async fn list_credential_deployments(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CredentialDeploymentsResponse>> {
    let credential =
        CredentialRepository::find_by_id_and_owner(&state.db, &state.cipher, id, &user.id).await?;

    let deployments = state
        .deployment_cache()
        .get_fresh_or_refresh(&credential)
        .await?;

    Ok(Json(CredentialDeploymentsResponse { deployments }))
}
