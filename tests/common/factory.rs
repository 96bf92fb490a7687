use time::Duration;
use uuid::Uuid;

use deployhub::models::{CreateCredential, Credential};
use deployhub::repositories::{CredentialRepository, UserRepository};
use deployhub::services::AuthService;
use deployhub::state::AppState;

/// Authentication info for tests
#[allow(dead_code)]
pub struct TestAuth {
    pub user_id: String,
    pub email: String,
    pub token: String,
}

impl TestAuth {
    /// Get the Authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Factory for creating test data
pub struct Factory<'a> {
    state: &'a AppState,
}

#[allow(dead_code)]
impl<'a> Factory<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Token for a subject that has never called the API
    pub fn token_for(&self, subject: &str, email: Option<&str>, name: Option<&str>) -> String {
        AuthService::generate_token(subject, email, name, Duration::hours(1), &self.state.config)
            .unwrap()
    }

    /// Create a test user and return auth info
    pub async fn create_user(&self) -> TestAuth {
        let user_id = format!("uid-{}", Uuid::new_v4());
        let email = format!("{}@example.com", user_id);

        UserRepository::find_or_create(&self.state.db, &user_id, Some(&email), Some("Test User"))
            .await
            .unwrap();

        let token = self.token_for(&user_id, Some(&email), Some("Test User"));

        TestAuth {
            user_id,
            email,
            token,
        }
    }

    /// Store a Render credential directly, skipping key validation
    pub async fn create_credential(&self, user_id: &str, api_key: &str) -> Credential {
        let input = CreateCredential {
            platform: "render".to_string(),
            name: format!("render {}", api_key),
            api_key: api_key.to_string(),
        };

        CredentialRepository::create(&self.state.db, &self.state.cipher, user_id, &input)
            .await
            .unwrap()
    }
}
