//! `X-VERIFY` request signatures.
//!
//! Every signature is `hex(SHA-256(material)) + "###" + key_index`, where the
//! material depends on the kind of call being signed.

mod claim;
mod x_verify;

pub use claim::SignatureClaim;
pub use x_verify::{digest_hex, sign, sign_input, SignatureInput, Signer, KEY_INDEX_SEPARATOR};
