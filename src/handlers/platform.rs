use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct PlatformListResponse {
    pub platforms: Vec<String>,
}

/// List the platforms credentials can be registered for
#[utoipa::path(
    get,
    path = "/api/platforms",
    responses(
        (status = 200, description = "Supported platforms", body = PlatformListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Platforms"
)]
pub async fn list_platforms(State(state): State<AppState>) -> Json<PlatformListResponse> {
    Json(PlatformListResponse {
        platforms: state.platforms.platforms(),
    })
}
