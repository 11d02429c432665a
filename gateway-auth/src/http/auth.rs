//! Authorization header schemes accepted by the gateway.

use std::fmt;
use std::str::FromStr;

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

/// Prefix placed before the access token in the `Authorization` header.
///
/// The subscription APIs have been observed with both `Bearer` and `O-Bearer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationScheme {
    #[default]
    Bearer,
    OBearer,
}

impl AuthorizationScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationScheme::Bearer => "Bearer",
            AuthorizationScheme::OBearer => "O-Bearer",
        }
    }

    /// Apply `Authorization: <scheme> <token>` to a request builder.
    pub fn authenticate(&self, request: RequestBuilder, token: &SecretString) -> RequestBuilder {
        request.header(
            reqwest::header::AUTHORIZATION,
            format!("{} {}", self.as_str(), token.expose_secret()),
        )
    }
}

impl fmt::Display for AuthorizationScheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct AuthorizationSchemeParseError;

impl FromStr for AuthorizationScheme {
    type Err = AuthorizationSchemeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "bearer" => Ok(AuthorizationScheme::Bearer),
            "o-bearer" => Ok(AuthorizationScheme::OBearer),
            _ => Err(AuthorizationSchemeParseError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_parse() {
        assert_eq!("Bearer".parse(), Ok(AuthorizationScheme::Bearer));
        assert_eq!("O-BEARER".parse(), Ok(AuthorizationScheme::OBearer));
        assert!("Basic".parse::<AuthorizationScheme>().is_err());
    }

    #[test]
    fn test_authenticate_sets_header() {
        let client = reqwest::Client::new();
        let token = SecretString::new("tok".to_string());
        let request = AuthorizationScheme::OBearer
            .authenticate(client.get("http://localhost/"), &token)
            .build()
            .unwrap();

        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "O-Bearer tok"
        );
    }
}
