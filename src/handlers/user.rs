use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::handlers::validate_optional;
use crate::middlewares::AuthUser;
use crate::models::{UpdateUser, UserResponse};
use crate::repositories::UserRepository;
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

// ============ Handlers ============

/// Get current user info, creating the account on first sign-in
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user info", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn me(user: AuthUser, State(state): State<AppState>) -> AppResult<Json<UserResponse>> {
    let user = UserRepository::find_or_create(
        &state.db,
        &user.id,
        user.email.as_deref(),
        user.name.as_deref(),
    )
    .await?;

    Ok(Json(user.into()))
}

/// Update current user profile
#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    validate_optional(payload.email.as_deref(), "Email")?;

    UserRepository::find_or_create(
        &state.db,
        &user.id,
        user.email.as_deref(),
        user.name.as_deref(),
    )
    .await?;

    let update = UpdateUser {
        display_name: payload.display_name,
        email: payload.email.map(|e| e.trim().to_string()),
    };

    let updated = UserRepository::update(&state.db, &user.id, &update).await?;
    Ok(Json(updated.into()))
}

/// Delete current user together with all credentials and cached deployments
#[utoipa::path(
    delete,
    path = "/api/users/me",
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn delete_me(user: AuthUser, State(state): State<AppState>) -> AppResult<StatusCode> {
    UserRepository::delete(&state.db, &user.id).await?;
    tracing::info!(user_id = %user.id, "Deleted user");
    Ok(StatusCode::NO_CONTENT)
}
