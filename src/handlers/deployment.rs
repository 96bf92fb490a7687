use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middlewares::AuthUser;
use crate::models::Deployment;
use crate::state::AppState;

// ============ Request/Response DTOs ============

/// A credential whose deployments could not be loaded
#[derive(Debug, Serialize, ToSchema)]
pub struct CredentialErrorResponse {
    pub credential_id: Uuid,
    pub platform: String,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeploymentListResponse {
    pub deployments: Vec<Deployment>,
    pub errors: Vec<CredentialErrorResponse>,
}

// ============ Handlers ============

/// All deployments across the current user's credentials.
///
/// Credentials that fail are listed under `errors` instead of failing the request.
#[utoipa::path(
    get,
    path = "/api/deployments",
    responses(
        (status = 200, description = "Aggregated deployments", body = DeploymentListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Deployments"
)]
pub async fn list_deployments(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DeploymentListResponse>> {
    let aggregation = state
        .aggregator()
        .get_all_deployments_for_user(&user.id)
        .await?;

    let errors = aggregation
        .failures()
        .map(|(result, reason)| CredentialErrorResponse {
            credential_id: result.credential_id,
            platform: result.platform.clone(),
            reason: reason.to_string(),
        })
        .collect();

    Ok(Json(DeploymentListResponse {
        deployments: aggregation.into_deployments(),
        errors,
    }))
}
