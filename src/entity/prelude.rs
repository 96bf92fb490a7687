pub use super::deployment_cache::Entity as DeploymentCache;
pub use super::platform_credential::Entity as PlatformCredential;
pub use super::user::Entity as User;
