//! Parsing of `<hex>###<keyIndex>` signature claims.

use std::str::FromStr;

use super::KEY_INDEX_SEPARATOR;
use crate::error::{webhook_error, Error, WebhookErrorKind};

/// A signature as presented by the gateway, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureClaim {
    pub digest: String,
    pub key_index: Option<u32>,
}

impl FromStr for SignatureClaim {
    type Err = Error;

    fn from_str(claim: &str) -> Result<Self, Self::Err> {
        let claim = claim.trim();
        if claim.is_empty() {
            return Err(webhook_error(
                WebhookErrorKind::MissingSignature,
                "Empty signature claim",
            ));
        }

        match claim.split_once(KEY_INDEX_SEPARATOR) {
            Some((digest, index)) => {
                let key_index = index.parse::<u32>().map_err(|_| {
                    webhook_error(
                        WebhookErrorKind::InvalidSignature,
                        "Signature key index is not a number",
                    )
                })?;
                Ok(SignatureClaim {
                    digest: digest.to_string(),
                    key_index: Some(key_index),
                })
            }
            // A bare digest is accepted; the key index is informational only.
            None => Ok(SignatureClaim {
                digest: claim.to_string(),
                key_index: None,
            }),
        }
    }
}
