pub mod deployment_cache;
pub mod platform_credential;
pub mod user;

pub mod prelude;

pub use prelude::*;
