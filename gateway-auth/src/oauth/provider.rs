//! OAuth provider trait.

use async_trait::async_trait;

use super::token::TokenGrant;
use crate::error::Error;

/// Trait for endpoints that issue access tokens.
///
/// Implementations perform exactly one network exchange per call and never retry.
/// Caching is the job of [`super::token::Manager`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Exchange the merchant's client credentials for a new access token.
    ///
    /// # Returns
    ///
    /// The token grant as issued, or an error carrying the upstream status and body.
    async fn exchange_client_credentials(&self) -> Result<TokenGrant, Error>;
}
