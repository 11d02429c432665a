//! Merchant credentials for the payment gateway.

mod merchant;

pub use merchant::Credentials;
