use std::fmt;

use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// A platform credential with its secret decrypted. Only ever held in memory;
/// handlers convert it into `CredentialResponse` before anything leaves the
/// process.
#[derive(Clone)]
pub struct Credential {
    pub id: Uuid,
    pub user_id: String,
    pub platform: String,
    pub name: String,
    pub api_key: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("platform", &self.platform)
            .field("name", &self.name)
            .field("api_key", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[derive(Deserialize)]
pub struct CreateCredential {
    pub platform: String,
    pub name: String,
    pub api_key: String,
}

#[derive(Deserialize)]
pub struct UpdateCredential {
    pub platform: Option<String>,
    pub name: Option<String>,
    pub api_key: Option<String>,
}

/// Platform names are matched case-insensitively and stored lower-case
pub fn normalize_platform(platform: &str) -> String {
    platform.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let credential = Credential {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            platform: "render".to_string(),
            name: "prod".to_string(),
            api_key: "rnd_super_secret".to_string(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };

        let printed = format!("{:?}", credential);
        assert!(!printed.contains("rnd_super_secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_normalize_platform() {
        assert_eq!(normalize_platform("  Render "), "render");
    }
}
