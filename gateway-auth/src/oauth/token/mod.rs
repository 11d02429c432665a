//! Access token caching with expiry-driven refresh.

mod clock;
mod manager;
mod tokens;

pub use clock::{Clock, SystemClock};
pub use manager::Manager;
pub use tokens::{CachedToken, TokenGrant};
