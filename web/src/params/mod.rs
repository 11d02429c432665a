//! This module holds typed parameters for endpoint inputs that the domain layer does
//! not already define.
//!
//! Request bodies that map one-to-one onto a domain request (subscription initiation,
//! redemption, webhook envelopes) are deserialized straight into the domain types.
//! The types here cover the remaining inputs: browser callbacks and one-off payments.

pub(crate) mod autopay;
