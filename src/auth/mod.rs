//! Authentication module
//!
//! The table API only speaks HTTP Basic; `None` exists for unauthenticated
//! endpoints and mock servers.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
