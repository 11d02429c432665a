use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use domain::error::{DomainErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind};

extern crate log;
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Validation(message) => {
                    error_body(StatusCode::BAD_REQUEST, &message)
                }
                InternalErrorKind::Decode => {
                    error_body(StatusCode::BAD_REQUEST, "Malformed response data")
                }
                InternalErrorKind::Signature => {
                    error_body(StatusCode::UNAUTHORIZED, "Invalid signature")
                }
                InternalErrorKind::Config(setting) => {
                    error!("Request failed on missing configuration: {setting}");
                    error_body(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR")
                }
                InternalErrorKind::Other(message) => {
                    error!("Internal error: {message}");
                    error_body(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR")
                }
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Upstream { status, body } => {
                    // Pass the gateway's JSON through as JSON when it is JSON
                    let upstream_body = serde_json::from_str::<Value>(&body)
                        .unwrap_or_else(|_| Value::String(body));
                    (
                        StatusCode::BAD_GATEWAY,
                        Json(json!({
                            "error": "Upstream request failed",
                            "upstreamStatus": status,
                            "upstreamBody": upstream_body,
                        })),
                    )
                        .into_response()
                }
                ExternalErrorKind::Timeout => {
                    error_body(StatusCode::GATEWAY_TIMEOUT, "Upstream request timed out")
                }
                ExternalErrorKind::Network => {
                    error_body(StatusCode::BAD_GATEWAY, "Upstream unreachable")
                }
                ExternalErrorKind::InvalidResponse => {
                    error_body(StatusCode::BAD_GATEWAY, "Upstream returned an invalid response")
                }
                ExternalErrorKind::Other(message) => {
                    warn!("External error: {message}");
                    error_body(StatusCode::BAD_GATEWAY, "BAD GATEWAY")
                }
            },
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
