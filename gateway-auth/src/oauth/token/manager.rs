//! Token manager with a single cached token and serialized refresh.

use secrecy::SecretString;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::{CachedToken, Clock, SystemClock};
use crate::error::Error;
use crate::oauth::Provider;

/// Token manager that hands out the cached access token and refreshes it on expiry.
///
/// The cache is a single slot: a token is replaced wholesale, never patched. Refreshes
/// are serialized behind one lock and re-check the slot after acquiring it, so callers
/// racing on an expired token converge on a single exchange.
pub struct Manager<P: Provider, C: Clock = SystemClock> {
    provider: P,
    clock: C,
    slot: RwLock<Option<CachedToken>>,
    refresh_lock: Mutex<()>,
}

impl<P: Provider> Manager<P, SystemClock> {
    /// Create a new token manager using wall-clock time.
    pub fn new(provider: P) -> Self {
        Self::with_clock(provider, SystemClock)
    }
}

impl<P: Provider, C: Clock> Manager<P, C> {
    /// Create a new token manager with an explicit time source.
    pub fn with_clock(provider: P, clock: C) -> Self {
        Self {
            provider,
            clock,
            slot: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Get a valid access token, exchanging credentials if needed.
    ///
    /// This method:
    /// 1. Returns the cached token if `now < expires_at`
    /// 2. Otherwise takes the refresh lock and checks the slot again
    /// 3. If still expired, performs exactly one client-credentials exchange
    /// 4. Stores and returns the new token
    ///
    /// A failed exchange is returned as-is; the expired token is never handed out.
    pub async fn get_token(&self) -> Result<SecretString, Error> {
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = self.current().await {
            debug!("Access token was refreshed by another request");
            return Ok(token);
        }

        debug!("No valid access token cached, exchanging client credentials");

        let grant = self.provider.exchange_client_credentials().await?;
        let cached = grant.into_cached(self.clock.now())?;
        let access_token = cached.access_token.clone();

        debug!("Access token cached until {}", cached.expires_at);
        *self.slot.write().await = Some(cached);

        Ok(access_token)
    }

    /// Drop the cached token so the next call performs a fresh exchange.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    /// Get the cached token (may be expired).
    pub async fn cached(&self) -> Option<CachedToken> {
        self.slot.read().await.clone()
    }

    async fn current(&self) -> Option<SecretString> {
        let now = self.clock.now();
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_valid_at(now))
            .map(|token| token.access_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::upstream_error;
    use crate::oauth::token::TokenGrant;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use secrecy::ExposeSecret;
    use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
    use std::sync::Arc;

    struct TestClock {
        epoch_secs: Arc<AtomicI64>,
    }

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_opt(self.epoch_secs.load(Ordering::SeqCst), 0)
                .unwrap()
        }
    }

    // Issues `token-N` expiring at a fixed epoch second, counting exchanges
    struct MockProvider {
        exchanges: Arc<AtomicU32>,
        expires_at: i64,
        fail: bool,
    }

    #[async_trait]
    impl Provider for MockProvider {
        async fn exchange_client_credentials(&self) -> Result<TokenGrant, Error> {
            let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(upstream_error(401, "unauthorized".to_string()));
            }
            Ok(TokenGrant {
                access_token: SecretString::new(format!("token-{}", n)),
                expires_at: Some(self.expires_at),
                expires_in: None,
                token_type: None,
            })
        }
    }

    fn manager(
        expires_at: i64,
        fail: bool,
    ) -> (
        Manager<MockProvider, TestClock>,
        Arc<AtomicU32>,
        Arc<AtomicI64>,
    ) {
        let exchanges = Arc::new(AtomicU32::new(0));
        let epoch_secs = Arc::new(AtomicI64::new(1_000));
        let manager = Manager::with_clock(
            MockProvider {
                exchanges: exchanges.clone(),
                expires_at,
                fail,
            },
            TestClock {
                epoch_secs: epoch_secs.clone(),
            },
        );
        (manager, exchanges, epoch_secs)
    }

    #[tokio::test]
    async fn test_first_call_exchanges_credentials() {
        let (manager, exchanges, _) = manager(2_000, false);

        let token = manager.get_token().await.unwrap();

        assert_eq!(token.expose_secret(), "token-1");
        assert_eq!(exchanges.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_token_reused_before_expiry() {
        let (manager, exchanges, clock) = manager(2_000, false);

        manager.get_token().await.unwrap();
        clock.store(1_999, Ordering::SeqCst);
        let token = manager.get_token().await.unwrap();

        assert_eq!(token.expose_secret(), "token-1");
        assert_eq!(exchanges.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_refreshed_once_at_expiry() {
        let (manager, exchanges, clock) = manager(2_000, false);

        manager.get_token().await.unwrap();
        clock.store(2_000, Ordering::SeqCst);
        let token = manager.get_token().await.unwrap();

        assert_eq!(token.expose_secret(), "token-2");
        assert_eq!(exchanges.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let (manager, exchanges, _) = manager(2_000, false);
        let manager = Arc::new(manager);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.get_token().await })
            })
            .collect();

        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.expose_secret(), "token-1");
        }
        assert_eq!(exchanges.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_exchange_never_returns_stale_token() {
        let (manager, _, clock) = manager(2_000, true);

        *manager.slot.write().await = Some(CachedToken {
            access_token: SecretString::new("stale".to_string()),
            expires_at: Utc.timestamp_opt(1_500, 0).unwrap(),
        });
        clock.store(1_600, Ordering::SeqCst);

        let result = manager.get_token().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_exchange() {
        let (manager, exchanges, _) = manager(2_000, false);

        manager.get_token().await.unwrap();
        manager.invalidate().await;
        assert!(manager.cached().await.is_none());

        manager.get_token().await.unwrap();
        assert_eq!(exchanges.load(Ordering::SeqCst), 2);
    }
}
