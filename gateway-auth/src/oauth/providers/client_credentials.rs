//! Client-credentials token endpoint of the payment gateway.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::credentials::Credentials;
use crate::error::{oauth_error, upstream_error, Error, OAuthErrorKind};
use crate::oauth::token::TokenGrant;

/// Path of the token endpoint relative to the API base URL.
pub const TOKEN_PATH: &str = "/v1/oauth/token";

/// Raw token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

/// Gateway client-credentials provider.
///
/// Posts `client_id`, `client_version`, `client_secret` and
/// `grant_type=client_credentials` as a URL-encoded form.
pub struct Provider {
    token_url: String,
    credentials: Credentials,
    http_client: reqwest::Client,
}

impl Provider {
    /// Create a new client-credentials provider.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Gateway API base URL (the token path is appended)
    /// * `credentials` - Merchant credentials
    /// * `http_client` - Client carrying the configured timeout
    pub fn new(base_url: &str, credentials: Credentials, http_client: reqwest::Client) -> Self {
        Self {
            token_url: format!("{}{}", base_url.trim_end_matches('/'), TOKEN_PATH),
            credentials,
            http_client,
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl crate::oauth::Provider for Provider {
    async fn exchange_client_credentials(&self) -> Result<TokenGrant, Error> {
        debug!("Requesting access token from {}", self.token_url);

        let form = [
            ("client_id", self.credentials.client_id()),
            ("client_version", self.credentials.client_version()),
            (
                "client_secret",
                self.credentials.client_secret().expose_secret().as_str(),
            ),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Token exchange rejected with status {}", status);
            return Err(upstream_error(status.as_u16(), body));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Token endpoint returned an unreadable body: {}", e);
            oauth_error(
                OAuthErrorKind::InvalidResponse,
                &format!("Unreadable token response: {}", e),
            )
        })?;

        Ok(TokenGrant {
            access_token: SecretString::new(token.access_token),
            expires_at: token.expires_at,
            expires_in: token.expires_in,
            token_type: token.token_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, HttpErrorKind};
    use crate::oauth::Provider as _;
    use mockito::{Matcher, Server};

    fn credentials() -> Credentials {
        Credentials::from_parts(
            Some("MERCHANT".to_string()),
            Some("client-id".to_string()),
            Some("client-secret".to_string()),
            Some("1".to_string()),
            1,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_exchange_posts_form_and_parses_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", TOKEN_PATH)
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("client_id".into(), "client-id".into()),
                Matcher::UrlEncoded("client_version".into(), "1".into()),
                Matcher::UrlEncoded("client_secret".into(), "client-secret".into()),
                Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"abc","expires_at":1893456000,"token_type":"O-Bearer"}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let provider = Provider::new(&server.url(), credentials(), reqwest::Client::new());
        let grant = provider.exchange_client_credentials().await.unwrap();

        assert_eq!(grant.access_token.expose_secret(), "abc");
        assert_eq!(grant.expires_at, Some(1_893_456_000));
        assert_eq!(grant.token_type.as_deref(), Some("O-Bearer"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_surfaces_upstream_status_and_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", TOKEN_PATH)
            .with_status(401)
            .with_body(r#"{"code":"INVALID_CLIENT"}"#)
            .create_async()
            .await;

        let provider = Provider::new(&server.url(), credentials(), reqwest::Client::new());
        let err = provider.exchange_client_credentials().await.unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Http(HttpErrorKind::Upstream {
                status: 401,
                body: r#"{"code":"INVALID_CLIENT"}"#.to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_exchange_rejects_body_without_token() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"expires_at":1893456000}"#)
            .create_async()
            .await;

        let provider = Provider::new(&server.url(), credentials(), reqwest::Client::new());
        let err = provider.exchange_client_credentials().await.unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::InvalidResponse)
        );
    }

    #[test]
    fn test_token_url_trims_trailing_slash() {
        let provider = Provider::new(
            "https://gateway.example/apis/pg-sandbox/",
            credentials(),
            reqwest::Client::new(),
        );
        assert_eq!(
            provider.token_url(),
            "https://gateway.example/apis/pg-sandbox/v1/oauth/token"
        );
    }
}
