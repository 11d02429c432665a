//! Business logic for the AutoPay integration: request validation, payload shapes,
//! the gateway client, and handling of what the gateway sends back.

pub use service::config::SetupVariant;

pub mod callback;
pub mod error;
pub mod money;
pub mod schedule;
pub mod subscription;
pub mod validation;
pub mod webhook;

pub mod gateway;

pub use gateway::autopay::AutoPayClient;
