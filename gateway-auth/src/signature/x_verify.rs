//! SHA-256 `X-VERIFY` computation.

use sha2::{Digest, Sha256};

use crate::credentials::Credentials;

/// Separator between the hex digest and the key index.
pub const KEY_INDEX_SEPARATOR: &str = "###";

/// What gets hashed, selected by call kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureInput<'a> {
    /// `body || path || secret`, used for POST calls carrying a base64 body.
    BodyAndPath { body: &'a [u8], path: &'a str },
    /// `path || secret`, used for bodiless status calls.
    PathOnly { path: &'a str },
    /// `path || "###" || key_index || secret`, the status-call variant that
    /// embeds the key index ahead of the secret.
    PathWithKeyIndex { path: &'a str },
}

impl<'a> SignatureInput<'a> {
    pub fn body_and_path(body: &'a str, path: &'a str) -> Self {
        SignatureInput::BodyAndPath {
            body: body.as_bytes(),
            path,
        }
    }

    fn hash(&self, secret: &str, key_index: u32) -> String {
        let mut hasher = Sha256::new();
        match self {
            SignatureInput::BodyAndPath { body, path } => {
                hasher.update(body);
                hasher.update(path.as_bytes());
            }
            SignatureInput::PathOnly { path } => {
                hasher.update(path.as_bytes());
            }
            SignatureInput::PathWithKeyIndex { path } => {
                hasher.update(path.as_bytes());
                hasher.update(KEY_INDEX_SEPARATOR.as_bytes());
                hasher.update(key_index.to_string().as_bytes());
            }
        }
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Compute `hex(SHA-256(body || path || secret)) + "###" + key_index`.
///
/// Pure and total: identical inputs always produce the identical header value.
pub fn sign(body: impl AsRef<[u8]>, path: &str, secret: &str, key_index: u32) -> String {
    sign_input(
        SignatureInput::BodyAndPath {
            body: body.as_ref(),
            path,
        },
        secret,
        key_index,
    )
}

/// Sign any [`SignatureInput`] variant.
pub fn sign_input(input: SignatureInput<'_>, secret: &str, key_index: u32) -> String {
    format!(
        "{}{}{}",
        input.hash(secret, key_index),
        KEY_INDEX_SEPARATOR,
        key_index
    )
}

/// Lowercase hex SHA-256 of the concatenated parts, without a key index suffix.
pub fn digest_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// Signs requests with the merchant's secret and key index.
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
}

impl Signer {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn sign(&self, input: SignatureInput<'_>) -> String {
        sign_input(input, self.credentials.salt(), self.credentials.key_index())
    }

    pub fn key_index(&self) -> u32 {
        self.credentials.key_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_well_formed(signature: &str, key_index: u32) -> bool {
        let Some((hex_part, index_part)) = signature.split_once(KEY_INDEX_SEPARATOR) else {
            return false;
        };
        hex_part.len() == 64
            && hex_part
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            && index_part == key_index.to_string()
    }

    #[test]
    fn test_sign_is_deterministic_and_well_formed() {
        let first = sign("eyJhbW91bnQiOjEwMH0=", "/pg/v1/pay", "salt", 1);
        let second = sign("eyJhbW91bnQiOjEwMH0=", "/pg/v1/pay", "salt", 1);

        assert_eq!(first, second);
        assert!(is_well_formed(&first, 1));
    }

    #[test]
    fn test_sign_matches_plain_concatenation() {
        let expected = format!(
            "{}###2",
            digest_hex(&[b"body/v3/recurring/auth/initsecret".as_slice()])
        );
        assert_eq!(sign("body", "/v3/recurring/auth/init", "secret", 2), expected);
    }

    #[test]
    fn test_sign_changes_with_each_input() {
        let base = sign("body", "/path", "secret", 1);

        assert_ne!(base, sign("bodY", "/path", "secret", 1));
        assert_ne!(base, sign("body", "/patH", "secret", 1));
        assert_ne!(base, sign("body", "/path", "secreT", 1));
        // Key index only affects the suffix.
        let other_index = sign("body", "/path", "secret", 2);
        assert_eq!(&base[..64], &other_index[..64]);
        assert!(other_index.ends_with("###2"));
    }

    #[test]
    fn test_path_only_signature_ignores_body() {
        let path = "/v3/transaction/MERCHANT/T1/status";
        let signature = sign_input(SignatureInput::PathOnly { path }, "secret", 1);

        assert_eq!(signature, sign("", path, "secret", 1));
        assert!(is_well_formed(&signature, 1));
    }

    #[test]
    fn test_path_with_key_index_embeds_index_before_secret() {
        let path = "/v3/transaction/T1/status";
        let signature = sign_input(SignatureInput::PathWithKeyIndex { path }, "secret", 1);

        let expected = format!(
            "{}###1",
            digest_hex(&[path.as_bytes(), b"###1".as_slice(), b"secret".as_slice()])
        );
        assert_eq!(signature, expected);
        assert_ne!(
            signature,
            sign_input(SignatureInput::PathOnly { path }, "secret", 1)
        );
    }

    #[test]
    fn test_signer_uses_credentials() {
        let credentials = Credentials::from_parts(
            Some("M".to_string()),
            Some("C".to_string()),
            Some("salt".to_string()),
            None,
            4,
        )
        .unwrap();
        let signer = Signer::new(credentials);

        assert_eq!(
            signer.sign(SignatureInput::body_and_path("abc", "/pg/v1/pay")),
            sign("abc", "/pg/v1/pay", "salt", 4)
        );
        assert_eq!(signer.key_index(), 4);
    }
}
