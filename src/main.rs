use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use deployhub::config::Config;
use deployhub::handlers::{
    CreateCredentialRequest, CredentialDeploymentsResponse, CredentialErrorResponse,
    CredentialListResponse, CredentialResponse, DeploymentListResponse, PlatformListResponse,
    UpdateCredentialRequest, UpdateUserRequest,
};
use deployhub::models::{Deployment, DeploymentStatus, UserResponse};
use deployhub::state::AppState;
use deployhub::{build_router, handlers};

/// Security scheme for Bearer token
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::user::me,
        handlers::user::update_me,
        handlers::user::delete_me,
        handlers::platform::list_platforms,
        handlers::credential::create_credential,
        handlers::credential::list_credentials,
        handlers::credential::get_credential,
        handlers::credential::update_credential,
        handlers::credential::delete_credential,
        handlers::credential::list_credential_deployments,
        handlers::deployment::list_deployments,
    ),
    components(schemas(
        UserResponse,
        UpdateUserRequest,
        PlatformListResponse,
        CreateCredentialRequest,
        UpdateCredentialRequest,
        CredentialResponse,
        CredentialListResponse,
        CredentialDeploymentsResponse,
        Deployment,
        DeploymentStatus,
        DeploymentListResponse,
        CredentialErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Current user endpoints"),
        (name = "Platforms", description = "Supported deployment platforms"),
        (name = "Credentials", description = "Platform credential management endpoints"),
        (name = "Deployments", description = "Aggregated deployment listing")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("deployhub=info,tower_http=info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let addr = config.server_addr();

    tracing::info!("Connecting to database...");
    let state = AppState::new(config)
        .await
        .expect("Failed to initialize application state");
    tracing::info!(
        platforms = ?state.platforms.platforms(),
        "Database ready, platforms registered"
    );

    // Build the main application router
    let app = build_router(state)
        // Add Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!("Server started on http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
