//! OAuth 2.0 client-credentials infrastructure.
//!
//! The gateway issues merchant-level access tokens through the client-credentials
//! grant; there is no user authorization step, refresh token, or PKCE.

mod provider;

pub mod providers;
pub mod token;

pub use provider::Provider;
