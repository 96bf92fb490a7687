pub mod credential;
pub mod deployment;
pub mod user;

pub use credential::*;
pub use deployment::*;
pub use user::*;
