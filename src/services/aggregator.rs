use std::sync::Arc;

use futures::future::join_all;
use sea_orm::DatabaseConnection;
use tracing::warn;
use uuid::Uuid;

use crate::entity::platform_credential;
use crate::error::AppResult;
use crate::models::Deployment;
use crate::repositories::CredentialRepository;
use crate::services::{DeploymentCache, SecretCipher};

/// What happened for one credential during aggregation
#[derive(Debug)]
pub enum CredentialOutcome {
    Success(Vec<Deployment>),
    Failure { reason: String },
}

#[derive(Debug)]
pub struct CredentialResult {
    pub credential_id: Uuid,
    pub platform: String,
    pub outcome: CredentialOutcome,
}

/// Per-credential results in the order the credentials were listed
#[derive(Debug, Default)]
pub struct Aggregation {
    pub results: Vec<CredentialResult>,
}

impl Aggregation {
    /// Successful deployments concatenated in credential order
    pub fn deployments(&self) -> Vec<Deployment> {
        self.results
            .iter()
            .filter_map(|r| match &r.outcome {
                CredentialOutcome::Success(deployments) => Some(deployments.iter().cloned()),
                CredentialOutcome::Failure { .. } => None,
            })
            .flatten()
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&CredentialResult, &str)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            CredentialOutcome::Failure { reason } => Some((r, reason.as_str())),
            CredentialOutcome::Success(_) => None,
        })
    }

    pub fn into_deployments(self) -> Vec<Deployment> {
        self.results
            .into_iter()
            .filter_map(|r| match r.outcome {
                CredentialOutcome::Success(deployments) => Some(deployments),
                CredentialOutcome::Failure { .. } => None,
            })
            .flatten()
            .collect()
    }
}

/// Collects every deployment visible to a user across all their credentials
#[derive(Clone)]
pub struct Aggregator {
    db: DatabaseConnection,
    cipher: Arc<SecretCipher>,
    cache: DeploymentCache,
}

impl Aggregator {
    pub fn new(db: DatabaseConnection, cipher: Arc<SecretCipher>, cache: DeploymentCache) -> Self {
        Self { db, cipher, cache }
    }

    /// Resolve every credential of `user_id` through the cache concurrently.
    ///
    /// One credential failing, including a secret that no longer decrypts,
    /// is logged and recorded; it never hides the others. Only failing to
    /// load the credential list is an error.
    pub async fn get_all_deployments_for_user(&self, user_id: &str) -> AppResult<Aggregation> {
        let sealed = CredentialRepository::list_sealed_by_owner(&self.db, user_id).await?;

        let results = join_all(sealed.into_iter().map(|row| self.resolve(row))).await;

        Ok(Aggregation { results })
    }

    async fn resolve(&self, row: platform_credential::Model) -> CredentialResult {
        let credential_id = row.id;
        let platform = row.platform.clone();

        let outcome = match self.fetch(row).await {
            Ok(deployments) => CredentialOutcome::Success(deployments),
            Err(err) => {
                warn!(
                    %credential_id,
                    %platform,
                    error = %err,
                    "Skipping credential while aggregating deployments"
                );
                CredentialOutcome::Failure {
                    reason: err.to_string(),
                }
            }
        };

        CredentialResult {
            credential_id,
            platform,
            outcome,
        }
    }

    async fn fetch(&self, row: platform_credential::Model) -> AppResult<Vec<Deployment>> {
        let credential = CredentialRepository::open(&self.cipher, row)?;
        self.cache.get_fresh_or_refresh(&credential).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::db;
    use crate::error::AppError;
    use crate::models::{CreateCredential, Credential, DeploymentStatus, Metadata};
    use crate::platforms::{PlatformAdapter, PlatformRegistry};
    use crate::repositories::UserRepository;

    /// Returns one deployment named after the key; keys starting with "bad"
    /// are rejected.
    struct KeyEchoAdapter;

    #[async_trait]
    impl PlatformAdapter for KeyEchoAdapter {
        fn name(&self) -> &str {
            "echo"
        }

        async fn validate(&self, _api_key: &str) -> AppResult<()> {
            Ok(())
        }

        async fn fetch_deployments(&self, api_key: &str) -> AppResult<Vec<Deployment>> {
            if api_key.starts_with("bad") {
                return Err(AppError::InvalidPlatformCredential("echo".to_string()));
            }
            Ok(vec![Deployment {
                id: format!("srv-{}", api_key),
                platform_credential_id: Uuid::nil(),
                name: api_key.to_string(),
                status: DeploymentStatus::Live,
                url: String::new(),
                last_deployed_at: None,
                branch: "main".to_string(),
                service_type: "web_service".to_string(),
                framework: String::new(),
                last_updated_at: OffsetDateTime::now_utc(),
                metadata: Metadata::new(),
            }])
        }
    }

    async fn setup() -> (Aggregator, DatabaseConnection, Arc<SecretCipher>) {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        db::create_schema(&conn).await.unwrap();
        UserRepository::find_or_create(&conn, "alice", None, None)
            .await
            .unwrap();

        let mut registry = PlatformRegistry::new();
        registry.register(Arc::new(KeyEchoAdapter));
        let cipher = Arc::new(SecretCipher::from_key_bytes(&[5u8; 32]).unwrap());
        let cache = DeploymentCache::new(
            conn.clone(),
            Arc::new(registry),
            std::time::Duration::from_secs(30),
        );

        (
            Aggregator::new(conn.clone(), cipher.clone(), cache),
            conn,
            cipher,
        )
    }

    async fn add(db: &DatabaseConnection, cipher: &SecretCipher, key: &str) -> Credential {
        let input = CreateCredential {
            platform: "echo".to_string(),
            name: key.to_string(),
            api_key: key.to_string(),
        };
        CredentialRepository::create(db, cipher, "alice", &input)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_one_failing_credential_does_not_hide_others() {
        let (aggregator, db, cipher) = setup().await;
        let first = add(&db, &cipher, "one").await;
        let broken = add(&db, &cipher, "bad-two").await;
        let third = add(&db, &cipher, "three").await;

        let aggregation = aggregator
            .get_all_deployments_for_user("alice")
            .await
            .unwrap();

        let deployments = aggregation.deployments();
        let ids: Vec<&str> = deployments.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["srv-one", "srv-three"]);
        assert_eq!(deployments[0].platform_credential_id, first.id);
        assert_eq!(deployments[1].platform_credential_id, third.id);

        let failures: Vec<_> = aggregation.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.credential_id, broken.id);
        assert_eq!(failures[0].0.platform, "echo");
    }

    #[tokio::test]
    async fn test_user_without_credentials_gets_nothing() {
        let (aggregator, _, _) = setup().await;

        let aggregation = aggregator
            .get_all_deployments_for_user("alice")
            .await
            .unwrap();

        assert!(aggregation.results.is_empty());
        assert!(aggregation.into_deployments().is_empty());
    }

    #[tokio::test]
    async fn test_undecryptable_secret_is_a_per_credential_failure() {
        use sea_orm::{ActiveModelTrait, EntityTrait, Set};

        let (aggregator, db, cipher) = setup().await;
        let healthy = add(&db, &cipher, "one").await;
        let damaged = add(&db, &cipher, "two").await;

        let row = platform_credential::Entity::find_by_id(damaged.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let mut row: platform_credential::ActiveModel = row.into();
        row.api_key = Set("not base64 at all".to_string());
        row.update(&db).await.unwrap();

        let aggregation = aggregator
            .get_all_deployments_for_user("alice")
            .await
            .unwrap();

        let deployments = aggregation.deployments();
        assert_eq!(deployments.len(), 1);
        assert_eq!(deployments[0].platform_credential_id, healthy.id);

        let failures: Vec<_> = aggregation.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.credential_id, damaged.id);
        assert!(failures[0].1.contains("Encryption"));
    }
}
