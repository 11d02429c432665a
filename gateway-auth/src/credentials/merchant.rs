//! Merchant credential set issued by the gateway.

use secrecy::{ExposeSecret, SecretString};

use crate::error::{missing_credential, Error};

/// Default client version sent with the token exchange.
pub const DEFAULT_CLIENT_VERSION: &str = "1";

/// Default salt/key index appended to `X-VERIFY` signatures.
pub const DEFAULT_KEY_INDEX: u32 = 1;

/// Credentials identifying the merchant to the gateway.
///
/// Loaded once at startup and never mutated afterwards. The client secret doubles
/// as the signing salt for `X-VERIFY` headers and webhook verification.
#[derive(Debug, Clone)]
pub struct Credentials {
    merchant_id: String,
    client_id: String,
    client_secret: SecretString,
    client_version: String,
    key_index: u32,
}

impl Credentials {
    /// Build credentials from optional configuration values.
    ///
    /// Returns a `Credential(Missing)` error naming the first absent or blank setting.
    pub fn from_parts(
        merchant_id: Option<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
        client_version: Option<String>,
        key_index: u32,
    ) -> Result<Self, Error> {
        let merchant_id = required(merchant_id, "merchant_id")?;
        let client_id = required(client_id, "client_id")?;
        let client_secret = required(client_secret, "client_secret")?;
        let client_version = client_version
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLIENT_VERSION.to_string());

        Ok(Self {
            merchant_id,
            client_id,
            client_secret: SecretString::new(client_secret),
            client_version,
            key_index,
        })
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    /// Convenience accessor for signing code that needs the raw salt.
    pub(crate) fn salt(&self) -> &str {
        self.client_secret.expose_secret()
    }

    pub fn client_version(&self) -> &str {
        &self.client_version
    }

    pub fn key_index(&self) -> u32 {
        self.key_index
    }
}

fn required(value: Option<String>, setting: &str) -> Result<String, Error> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| missing_credential(setting))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CredentialErrorKind, ErrorKind};

    #[test]
    fn test_from_parts_applies_client_version_default() {
        let credentials = Credentials::from_parts(
            Some("MERCHANT".to_string()),
            Some("client".to_string()),
            Some("secret".to_string()),
            None,
            DEFAULT_KEY_INDEX,
        )
        .unwrap();

        assert_eq!(credentials.merchant_id(), "MERCHANT");
        assert_eq!(credentials.client_version(), DEFAULT_CLIENT_VERSION);
        assert_eq!(credentials.key_index(), 1);
        assert_eq!(credentials.salt(), "secret");
    }

    #[test]
    fn test_from_parts_rejects_blank_secret() {
        let err = Credentials::from_parts(
            Some("MERCHANT".to_string()),
            Some("client".to_string()),
            Some("   ".to_string()),
            None,
            DEFAULT_KEY_INDEX,
        )
        .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Credential(CredentialErrorKind::Missing("client_secret".to_string()))
        );
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let credentials = Credentials::from_parts(
            Some("MERCHANT".to_string()),
            Some("client".to_string()),
            Some("super-secret-salt".to_string()),
            Some("2".to_string()),
            3,
        )
        .unwrap();

        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("super-secret-salt"));
    }
}
