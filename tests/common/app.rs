use axum_test::TestServer;
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use deployhub::build_router;
use deployhub::config::Config;
use deployhub::db;
use deployhub::platforms::PlatformRegistry;
use deployhub::state::AppState;

/// Test configuration; the Render API points at `render_url`
pub fn test_config(render_url: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-jwt-secret-that-is-at-least-32-characters-long".to_string(),
        encryption_key: general_purpose::STANDARD.encode([42u8; 32]),
        cache_ttl_seconds: 30,
        platform_timeout_seconds: 5,
        render_api_url: render_url.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        log_json: false,
    }
}

/// Test application wrapper
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    /// Stand-in for api.render.com
    pub render: MockServer,
}

#[allow(dead_code)]
impl TestApp {
    /// Create a new test application over a fresh in-memory database
    pub async fn new() -> Self {
        let render = MockServer::start().await;
        let config = test_config(&render.uri());

        let db = db::connect(&config.database_url)
            .await
            .expect("Failed to open test database");
        db::migrate(&db).await.expect("Failed to create schema");

        let platforms =
            PlatformRegistry::from_config(&config).expect("Failed to build platform registry");
        let state = AppState::with_platforms(db, config, platforms)
            .expect("Failed to create test app state");

        let router = build_router(state.clone());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            state,
            render,
        }
    }

    /// Serve `services` to requests carrying `api_key`, expecting exactly `times` calls
    pub async fn mock_render_services(&self, api_key: &str, services: Vec<Value>, times: u64) {
        Mock::given(method("GET"))
            .and(path("/services"))
            .and(header("authorization", format!("Bearer {}", api_key).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(services)))
            .expect(times)
            .mount(&self.render)
            .await;
    }

    /// Reject `api_key` with 401
    pub async fn mock_render_unauthorized(&self, api_key: &str) {
        Mock::given(method("GET"))
            .and(path("/services"))
            .and(header("authorization", format!("Bearer {}", api_key).as_str()))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "unauthorized"})),
            )
            .mount(&self.render)
            .await;
    }

    /// Fail every request for `api_key` with `status`
    pub async fn mock_render_failure(&self, api_key: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path("/services"))
            .and(header("authorization", format!("Bearer {}", api_key).as_str()))
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream trouble"))
            .mount(&self.render)
            .await;
    }
}

/// One entry of Render's `GET /services` response
#[allow(dead_code)]
pub fn render_service(id: &str, status: &str, repo: &str) -> Value {
    json!({
        "service": {
            "id": id,
            "name": format!("svc-{}", id),
            "type": "web_service",
            "branch": "main",
            "suspended": "not_suspended",
            "status": status,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-02-01T12:30:00Z",
            "autoDeploy": "yes",
            "repo": repo,
            "dashboardUrl": format!("https://dashboard.render.com/web/{}", id),
            "serviceDetails": {
                "url": format!("https://{}.onrender.com", id),
                "buildPlan": "starter"
            }
        },
        "cursor": "c1"
    })
}
