pub mod common;
pub mod credential;
pub mod deployment;
pub mod platform;
pub mod user;

pub use common::{validate_optional, validate_required};
pub use credential::{
    create_credential, delete_credential, get_credential, list_credential_deployments,
    list_credentials, update_credential, CreateCredentialRequest, CredentialDeploymentsResponse,
    CredentialListResponse, CredentialResponse, UpdateCredentialRequest,
};
pub use deployment::{list_deployments, CredentialErrorResponse, DeploymentListResponse};
pub use platform::{list_platforms, PlatformListResponse};
pub use user::{delete_me, me, update_me, UpdateUserRequest};
