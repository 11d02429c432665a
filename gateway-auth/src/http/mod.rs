//! HTTP client building and request authorization.

mod auth;
mod client;

pub use auth::{AuthorizationScheme, AuthorizationSchemeParseError};
pub use client::{GatewayClientBuilder, HttpClientConfig, DEFAULT_TIMEOUT};
