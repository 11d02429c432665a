//! Error types for the `domain` layer.
use gateway_auth::error::{
    CredentialErrorKind, Error as GatewayAuthError, ErrorKind as GatewayAuthErrorKind,
    HttpErrorKind, OAuthErrorKind,
};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error. `web` depends on
/// `domain` but never directly on `gateway-auth`, so every `gateway-auth` failure is
/// translated here and `web` maps the resulting kinds onto HTTP status codes.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Errors caused by our own configuration or by the caller's input.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    /// A required setting is absent. Holds the setting name.
    Config(String),
    /// Caller input failed validation. Holds a client-safe message.
    Validation(String),
    /// A signature claim did not match.
    Signature,
    /// An inbound payload could not be decoded.
    Decode,
    Other(String),
}

/// Errors caused by the gateway or the network between us and it.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    /// The gateway answered with a non-2xx status.
    Upstream { status: u16, body: String },
    Timeout,
    Network,
    /// The gateway answered 2xx with a body we could not read.
    InvalidResponse,
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(
            self.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Validation(_))
        )
    }
}

// This is where we translate errors from the `gateway-auth` layer to the `domain` layer.
impl From<GatewayAuthError> for Error {
    fn from(err: GatewayAuthError) -> Self {
        let error_kind = match &err.error_kind {
            GatewayAuthErrorKind::Credential(CredentialErrorKind::Missing(setting)) => {
                DomainErrorKind::Internal(InternalErrorKind::Config(setting.clone()))
            }
            GatewayAuthErrorKind::OAuth(OAuthErrorKind::InvalidResponse) => {
                DomainErrorKind::External(ExternalErrorKind::InvalidResponse)
            }
            GatewayAuthErrorKind::Webhook(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Signature)
            }
            GatewayAuthErrorKind::Http(HttpErrorKind::Upstream { status, body }) => {
                DomainErrorKind::External(ExternalErrorKind::Upstream {
                    status: *status,
                    body: body.clone(),
                })
            }
            GatewayAuthErrorKind::Http(HttpErrorKind::Timeout) => {
                DomainErrorKind::External(ExternalErrorKind::Timeout)
            }
            GatewayAuthErrorKind::Http(HttpErrorKind::Decode) => {
                DomainErrorKind::External(ExternalErrorKind::InvalidResponse)
            }
            // Errors that result from issues building the request. These occur
            // before any network call is made.
            GatewayAuthErrorKind::Http(HttpErrorKind::BuilderFailed) => DomainErrorKind::Internal(
                InternalErrorKind::Other("Failed to build gateway request".to_string()),
            ),
            GatewayAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        GatewayAuthError::from(err).into()
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Decode),
        }
    }
}

/// Build a validation error carrying a message that is safe to show the caller.
pub fn validation_error(message: impl Into<String>) -> Error {
    let message = message.into();
    Error {
        source: Some(message.clone().into()),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Validation(message)),
    }
}

/// Build an error for a required setting that is not configured.
pub fn config_error(setting: &str) -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Config(setting.to_string())),
    }
}

/// Build an error for an inbound payload that could not be decoded.
pub fn decode_error(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Error {
    Error {
        source: Some(source.into()),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Decode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_auth::error::{missing_credential, upstream_error, webhook_error, WebhookErrorKind};

    #[test]
    fn test_upstream_status_and_body_survive_translation() {
        let err: Error = upstream_error(400, "{\"code\":\"BAD_REQUEST\"}".to_string()).into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Upstream {
                status: 400,
                body: "{\"code\":\"BAD_REQUEST\"}".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_credential_becomes_config_error() {
        let err: Error = missing_credential("client_secret").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config("client_secret".to_string()))
        );
    }

    #[test]
    fn test_webhook_signature_errors_become_signature_kind() {
        let err: Error = webhook_error(WebhookErrorKind::MissingSignature, "empty").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Signature)
        );
    }

    #[test]
    fn test_validation_error_keeps_message() {
        let err = validation_error("Invalid phone number. Must be 10 digits.");
        assert!(err.is_validation());
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Validation(
                "Invalid phone number. Must be 10 digits.".to_string()
            ))
        );
    }
}
