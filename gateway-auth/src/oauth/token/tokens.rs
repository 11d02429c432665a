//! OAuth token types.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use secrecy::SecretString;

use crate::error::{oauth_error, Error, OAuthErrorKind};

/// Token as returned by the token endpoint, before expiry is resolved.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    /// Access token for API requests.
    pub access_token: SecretString,
    /// Absolute expiry in seconds since the epoch, when the gateway sends one.
    pub expires_at: Option<i64>,
    /// Relative lifetime in seconds, used when no absolute expiry is sent.
    pub expires_in: Option<i64>,
    /// Token type as reported by the gateway.
    pub token_type: Option<String>,
}

impl TokenGrant {
    /// Resolve the grant into a cacheable token relative to `now`.
    pub fn into_cached(self, now: DateTime<Utc>) -> Result<CachedToken, Error> {
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(epoch_secs), _) => Utc.timestamp_opt(epoch_secs, 0).single().ok_or_else(|| {
                oauth_error(
                    OAuthErrorKind::InvalidResponse,
                    "Token expiry is not a valid timestamp",
                )
            })?,
            (None, Some(secs)) => TimeDelta::try_seconds(secs)
                .and_then(|lifetime| now.checked_add_signed(lifetime))
                .ok_or_else(|| {
                    oauth_error(
                        OAuthErrorKind::InvalidResponse,
                        "Token lifetime is out of range",
                    )
                })?,
            (None, None) => {
                return Err(oauth_error(
                    OAuthErrorKind::InvalidResponse,
                    "Token response carries neither expires_at nor expires_in",
                ))
            }
        };

        Ok(CachedToken {
            access_token: self.access_token,
            expires_at,
        })
    }
}

/// Access token held in the cache until its absolute expiry.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// A token is usable only strictly before its recorded expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
