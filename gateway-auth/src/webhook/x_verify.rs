//! SHA-256 webhook signature validation.

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::WebhookValidator;
use crate::credentials::Credentials;
use crate::error::Error;
use crate::signature::{digest_hex, SignatureClaim};

/// Validates `X-VERIFY` claims on gateway notifications.
///
/// The expected digest is `hex(SHA-256(payload || secret))`; only the digest part
/// of a `<hex>###<keyIndex>` claim takes part in the comparison.
pub struct XVerifyWebhookValidator {
    secret: SecretString,
}

impl XVerifyWebhookValidator {
    /// Create a new validator.
    ///
    /// # Arguments
    ///
    /// * `secret` - Webhook signing secret (the merchant's client secret)
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Create a validator that signs with the merchant's client secret.
    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::new(credentials.client_secret().clone())
    }

    /// Digest the gateway is expected to send for `payload`.
    pub fn expected_digest(&self, payload: &str) -> String {
        digest_hex(&[payload.as_bytes(), self.secret.expose_secret().as_bytes()])
    }
}

impl WebhookValidator for XVerifyWebhookValidator {
    fn validate(&self, payload: &str, claim: &str) -> Result<bool, Error> {
        let claim: SignatureClaim = claim.parse()?;
        let expected = self.expected_digest(payload);

        let valid: bool = expected
            .as_bytes()
            .ct_eq(claim.digest.as_bytes())
            .into();

        if !valid {
            warn!("Webhook signature mismatch (key index {:?})", claim.key_index);
        }

        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret";
    const PAYLOAD: &str = "eyJjb2RlIjoiUEFZTUVOVF9TVUNDRVNTIn0=";

    fn validator() -> XVerifyWebhookValidator {
        XVerifyWebhookValidator::new(SecretString::new(SECRET.to_string()))
    }

    fn valid_claim() -> String {
        format!("{}###1", digest_hex(&[PAYLOAD.as_bytes(), SECRET.as_bytes()]))
    }

    fn accepted(payload: &str, claim: &str) -> bool {
        matches!(validator().validate(payload, claim), Ok(true))
    }

    fn flip(value: &str, index: usize) -> String {
        value
            .char_indices()
            .map(|(i, c)| {
                if i != index {
                    c
                } else if c == 'a' {
                    'b'
                } else {
                    'a'
                }
            })
            .collect()
    }

    #[test]
    fn test_valid_signature() {
        assert!(accepted(PAYLOAD, &valid_claim()));
    }

    #[test]
    fn test_bare_digest_is_accepted() {
        let claim = digest_hex(&[PAYLOAD.as_bytes(), SECRET.as_bytes()]);
        assert!(accepted(PAYLOAD, &claim));
    }

    #[test]
    fn test_any_flipped_payload_character_is_rejected() {
        let claim = valid_claim();
        for index in 0..PAYLOAD.len() {
            assert!(
                !accepted(&flip(PAYLOAD, index), &claim),
                "flipping payload position {} should be rejected",
                index
            );
        }
    }

    #[test]
    fn test_any_flipped_claim_character_is_rejected() {
        let claim = valid_claim();
        for index in 0..claim.len() {
            assert!(
                !accepted(PAYLOAD, &flip(&claim, index)),
                "flipping claim position {} should be rejected",
                index
            );
        }
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let other = XVerifyWebhookValidator::new(SecretString::new("other_secret".to_string()));
        assert!(!other.validate(PAYLOAD, &valid_claim()).unwrap());
    }

    #[test]
    fn test_credentials_secret_is_the_signing_salt() {
        let credentials = Credentials::from_parts(
            Some("MERCHANT".to_string()),
            Some("client".to_string()),
            Some(SECRET.to_string()),
            None,
            1,
        )
        .unwrap();
        let from_credentials = XVerifyWebhookValidator::from_credentials(&credentials);
        assert!(from_credentials.validate(PAYLOAD, &valid_claim()).unwrap());
    }

    #[test]
    fn test_invalid_claim_format() {
        let result = validator().validate(PAYLOAD, "deadbeef###one");
        assert!(result.is_err());
    }
}
