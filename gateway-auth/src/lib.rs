//! # gateway-auth
//!
//! Single source of truth for authentication against the AutoPay payment gateway:
//! - Merchant credentials loaded once at startup
//! - `X-VERIFY` request signatures (SHA-256 over body, path and secret)
//! - OAuth client-credentials exchange with a single-slot token cache
//! - HTTP client building with an explicit timeout
//! - Webhook signature validation
//!
//! ## Architecture
//!
//! This crate provides the authentication foundation that `domain` builds its
//! gateway client upon. It knows nothing about payload shapes or call kinds.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_auth::{
//!     credentials::Credentials,
//!     oauth::{providers::ClientCredentialsProvider, token::Manager},
//!     signature::{sign, SignatureInput},
//!     webhook::{WebhookValidator, XVerifyWebhookValidator},
//!     http::GatewayClientBuilder,
//! };
//! ```

pub mod credentials;
pub mod error;
pub mod http;
pub mod oauth;
pub mod signature;
pub mod webhook;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
