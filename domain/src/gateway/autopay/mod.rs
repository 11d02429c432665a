//! Outbound calls to the payment gateway's subscription and legacy signed APIs.

mod call;
mod client;
pub mod envelope;
pub mod payload;

pub use call::{Authentication, CallKind, StatusPath};
pub use client::{
    AutoPayClient, ClientSettings, SetupOutcome, SignedOutcome, VpaValidationOutcome,
};
