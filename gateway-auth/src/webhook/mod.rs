//! Webhook signature validation.

mod x_verify;

pub use x_verify::XVerifyWebhookValidator;

use crate::error::Error;

/// Trait for validating webhook signatures.
pub trait WebhookValidator: Send + Sync {
    /// Validate a webhook notification.
    ///
    /// # Arguments
    ///
    /// * `payload` - The raw (still base64-encoded) notification payload
    /// * `claim` - The signature claim sent alongside it
    ///
    /// # Returns
    ///
    /// `true` if signature is valid, `false` otherwise. A malformed claim is an error.
    fn validate(&self, payload: &str, claim: &str) -> Result<bool, Error>;
}
