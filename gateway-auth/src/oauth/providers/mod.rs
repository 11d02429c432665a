//! Token endpoint implementations.

pub mod client_credentials;

pub use client_credentials::Provider as ClientCredentialsProvider;
