//! Round-robin pool of homogeneous quote clients.
//!
//! Selection happens under a single lock over the rotation cursor, and the
//! chosen client is handed out as a [`ClientLease`] that keeps its in-flight
//! count raised until dropped. The network call itself runs with the lock
//! released, so a slow client never blocks selection for other requests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;

use crate::errors::ProviderError;
use crate::models::RawQuote;
use crate::provider::QuoteProvider;

use super::cooldown::{CooldownPolicy, CooldownTracker};
use super::validator::QuoteValidator;

/// A pool member: one provider plus its availability state.
pub struct PooledClient {
    provider: Arc<dyn QuoteProvider>,
    cooldown: CooldownTracker,
    policy: CooldownPolicy,
    in_flight: AtomicUsize,
}

impl PooledClient {
    pub fn new(provider: Arc<dyn QuoteProvider>, policy: CooldownPolicy) -> Self {
        Self {
            provider,
            cooldown: CooldownTracker::new(),
            policy,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> &str {
        self.provider.id()
    }

    pub fn cooldown(&self) -> &CooldownTracker {
        &self.cooldown
    }

    pub fn is_available(&self) -> bool {
        self.cooldown.is_available()
    }

    /// Number of requests currently holding a lease on this client.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Call the provider once, bounded by `timeout`.
    ///
    /// Any failure, including a timeout or a quote the validator rejects,
    /// puts this client into cooldown before the error is returned.
    pub async fn fetch(
        &self,
        symbol: &str,
        timeout: Duration,
        validator: &QuoteValidator,
    ) -> Result<RawQuote, ProviderError> {
        let result = match tokio::time::timeout(timeout, self.provider.fetch(symbol)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(self.id())),
        };

        let result = result.and_then(|quote| {
            let quote = quote.sanitized();
            validator.validate(self.id(), &quote)?;
            Ok(quote)
        });

        if let Err(ref e) = result {
            self.record_failure(e);
        }

        result
    }

    /// Suspend this client for the duration matching the error kind.
    pub fn record_failure(&self, error: &ProviderError) {
        let duration = self.policy.cooldown_for(error.kind());
        warn!(
            "{} entering {}s cooldown ({}): {}",
            self.id(),
            duration.as_secs(),
            error.kind(),
            error
        );
        self.cooldown.set_cooldown(duration);
    }
}

/// Exclusive-ish claim on a pool client for the duration of one call.
///
/// Dropping the lease releases the in-flight claim.
pub struct ClientLease<'a> {
    index: usize,
    client: &'a PooledClient,
}

impl<'a> ClientLease<'a> {
    fn acquire(index: usize, client: &'a PooledClient) -> Self {
        client.in_flight.fetch_add(1, Ordering::SeqCst);
        Self { index, client }
    }

    /// Position of the client in the pool.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn client(&self) -> &'a PooledClient {
        self.client
    }
}

impl Drop for ClientLease<'_> {
    fn drop(&mut self) {
        self.client.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Point-in-time status of one pool client.
#[derive(Clone, Debug, Serialize)]
pub struct ClientStatus {
    pub id: String,
    pub available: bool,
    /// Seconds left in the current cooldown
    pub cooldown_remaining_secs: Option<u64>,
    pub in_flight: usize,
}

/// Ordered set of clients with a shared rotation cursor.
pub struct ClientPool {
    clients: Vec<PooledClient>,
    cursor: Mutex<usize>,
}

impl ClientPool {
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, policy: CooldownPolicy) -> Self {
        Self {
            clients: providers
                .into_iter()
                .map(|provider| PooledClient::new(provider, policy))
                .collect(),
            cursor: Mutex::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn clients(&self) -> &[PooledClient] {
        &self.clients
    }

    pub fn get(&self, index: usize) -> Option<&PooledClient> {
        self.clients.get(index)
    }

    /// Lock the cursor, recovering from poison if necessary.
    fn lock_cursor(&self) -> MutexGuard<'_, usize> {
        self.cursor.lock().unwrap_or_else(|poisoned| {
            warn!("Client pool cursor mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Pick the next client to call, skipping those in `tried`.
    ///
    /// Scans at most N slots from the cursor, advancing it past every slot
    /// it looks at. Cooling-down clients are skipped. An idle client wins
    /// over one already serving another request. A busy client is only
    /// handed out when the pool is oversubscribed, meaning the outstanding
    /// leases cover every slot. Returns `None` when every remaining client
    /// is cooling down, already tried, or busy without oversubscription.
    pub fn select(&self, tried: &HashSet<usize>) -> Option<ClientLease<'_>> {
        let n = self.clients.len();
        if n == 0 {
            return None;
        }

        let mut cursor = self.lock_cursor();
        let mut busy: Option<usize> = None;

        for _ in 0..n {
            let index = *cursor % n;
            *cursor = (index + 1) % n;

            let client = &self.clients[index];
            if tried.contains(&index) || !client.is_available() {
                continue;
            }

            if client.in_flight() == 0 {
                debug!("Selected idle client {}", client.id());
                return Some(ClientLease::acquire(index, client));
            }

            if busy.is_none() {
                busy = Some(index);
            }
        }

        let index = busy?;
        if self.leased() < n {
            debug!("Remaining clients are busy serving other requests, not sharing");
            return None;
        }

        *cursor = (index + 1) % n;
        let client = &self.clients[index];
        debug!(
            "All clients leased, sharing {} ({} in flight)",
            client.id(),
            client.in_flight()
        );
        Some(ClientLease::acquire(index, client))
    }

    /// Total leases currently held across the pool.
    fn leased(&self) -> usize {
        self.clients.iter().map(PooledClient::in_flight).sum()
    }

    /// Status of every client, in pool order.
    pub fn availability(&self) -> Vec<ClientStatus> {
        self.clients
            .iter()
            .map(|client| ClientStatus {
                id: client.id().to_string(),
                available: client.is_available(),
                cooldown_remaining_secs: client.cooldown().remaining().map(|d| d.as_secs()),
                in_flight: client.in_flight(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct Named(String);

    #[async_trait]
    impl QuoteProvider for Named {
        fn id(&self) -> &str {
            &self.0
        }

        async fn fetch(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
            Ok(RawQuote::new(symbol, dec!(1)))
        }
    }

    fn pool(n: usize) -> ClientPool {
        let providers: Vec<Arc<dyn QuoteProvider>> = (0..n)
            .map(|i| Arc::new(Named(format!("client-{}", i))) as Arc<dyn QuoteProvider>)
            .collect();
        ClientPool::new(providers, CooldownPolicy::default())
    }

    #[test]
    fn test_select_rotates() {
        let pool = pool(3);
        let none = HashSet::new();

        let picks: Vec<usize> = (0..6)
            .map(|_| pool.select(&none).map(|lease| lease.index()).unwrap())
            .collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_select_skips_cooling_and_tried() {
        let pool = pool(3);
        pool.clients()[0].cooldown().set_cooldown(Duration::from_secs(60));

        let mut tried = HashSet::new();
        tried.insert(1);

        let lease = pool.select(&tried).unwrap();
        assert_eq!(lease.index(), 2);
        drop(lease);

        tried.insert(2);
        assert!(pool.select(&tried).is_none());
    }

    #[test]
    fn test_select_prefers_idle_client() {
        let pool = pool(2);
        let none = HashSet::new();

        let first = pool.select(&none).unwrap();
        let second = pool.select(&none).unwrap();
        assert_ne!(first.index(), second.index());

        // Both busy: the pool shares one rather than returning nothing
        let third = pool.select(&none).unwrap();
        assert_eq!(pool.clients()[third.index()].in_flight(), 2);

        drop(first);
        drop(second);
        drop(third);
        assert!(pool.clients().iter().all(|c| c.in_flight() == 0));
    }

    #[test]
    fn test_busy_client_not_shared_without_oversubscription() {
        let pool = pool(3);
        let none = HashSet::new();

        let held = pool.select(&none).unwrap();
        assert_eq!(held.index(), 0);

        // This request already tried the other two; client 0 is busy
        // but only one of three slots is leased.
        let tried: HashSet<usize> = [1, 2].into_iter().collect();
        assert!(pool.select(&tried).is_none());
        assert_eq!(held.client().in_flight(), 1);
    }

    #[test]
    fn test_lease_releases_on_drop() {
        let pool = pool(1);
        let none = HashSet::new();
        {
            let lease = pool.select(&none).unwrap();
            assert_eq!(lease.client().in_flight(), 1);
        }
        assert_eq!(pool.clients()[0].in_flight(), 0);
    }

    #[test]
    fn test_empty_pool() {
        let pool = pool(0);
        assert!(pool.is_empty());
        assert!(pool.select(&HashSet::new()).is_none());
        assert!(pool.availability().is_empty());
    }

    #[test]
    fn test_availability_report() {
        let pool = pool(2);
        pool.clients()[1].record_failure(&ProviderError::rate_limited("client-1"));

        let status = pool.availability();
        assert!(status[0].available);
        assert!(status[0].cooldown_remaining_secs.is_none());
        assert!(!status[1].available);
        assert!(status[1].cooldown_remaining_secs.unwrap() > 290);
    }

    #[tokio::test]
    async fn test_fetch_timeout_sets_cooldown() {
        struct Slow;

        #[async_trait]
        impl QuoteProvider for Slow {
            fn id(&self) -> &str {
                "slow"
            }

            async fn fetch(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(RawQuote::new(symbol, dec!(1)))
            }
        }

        let client = PooledClient::new(Arc::new(Slow), CooldownPolicy::default());
        let error = client
            .fetch("AAPL", Duration::from_millis(10), &QuoteValidator::new())
            .await
            .unwrap_err();

        assert!(matches!(error, ProviderError::Timeout { .. }));
        assert!(!client.is_available());
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_quote() {
        struct Zero;

        #[async_trait]
        impl QuoteProvider for Zero {
            fn id(&self) -> &str {
                "zero"
            }

            async fn fetch(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
                Ok(RawQuote::new(symbol, dec!(0)))
            }
        }

        let client = PooledClient::new(Arc::new(Zero), CooldownPolicy::default());
        let error = client
            .fetch("AAPL", Duration::from_secs(1), &QuoteValidator::new())
            .await
            .unwrap_err();

        assert!(matches!(error, ProviderError::InvalidResponse { .. }));
        let remaining = client.cooldown().remaining().unwrap();
        assert!(remaining > Duration::from_secs(170));
    }
}
