pub mod credential;
pub mod user;

pub use credential::CredentialRepository;
pub use user::UserRepository;
