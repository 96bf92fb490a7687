pub mod aggregator;
pub mod auth;
pub mod crypto;
pub mod deployment_cache;

pub use aggregator::{Aggregation, Aggregator, CredentialOutcome, CredentialResult};
pub use auth::{AuthService, Claims};
pub use crypto::SecretCipher;
pub use deployment_cache::{DeploymentCache, Snapshot};
