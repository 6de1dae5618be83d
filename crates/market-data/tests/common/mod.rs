//! Instrumented stub providers shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockron_market_data::{ProviderError, QuoteProvider, RawQuote};

/// What a stub does when called.
#[derive(Clone)]
pub enum Behavior {
    Succeed(Decimal),
    RateLimit,
    Fail,
    Invalid,
}

/// Stub quote client that counts calls and tracks overlapping calls.
pub struct StubClient {
    pub id: String,
    behavior: Mutex<Behavior>,
    delay: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl StubClient {
    pub fn new(id: impl Into<String>, behavior: Behavior) -> Arc<Self> {
        Self::with_delay(id, behavior, Duration::ZERO)
    }

    pub fn with_delay(id: impl Into<String>, behavior: Behavior, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            behavior: Mutex::new(behavior),
            delay,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    pub fn ok(id: impl Into<String>) -> Arc<Self> {
        Self::new(id, Behavior::Succeed(dec!(100)))
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous calls seen on this stub.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for StubClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let behavior = self.behavior.lock().unwrap().clone();
        self.active.fetch_sub(1, Ordering::SeqCst);

        match behavior {
            Behavior::Succeed(price) => Ok(RawQuote {
                pe: 30.0,
                history_points: 126,
                ..RawQuote::new(symbol, price)
            }),
            Behavior::RateLimit => Err(ProviderError::rate_limited(&self.id)),
            Behavior::Fail => Err(ProviderError::transport(&self.id, "HTTP 502 Bad Gateway")),
            Behavior::Invalid => Err(ProviderError::invalid_response(&self.id, "empty body")),
        }
    }
}

/// Upcast stubs for the orchestrator constructors.
pub fn providers(stubs: &[Arc<StubClient>]) -> Vec<Arc<dyn QuoteProvider>> {
    stubs
        .iter()
        .map(|s| s.clone() as Arc<dyn QuoteProvider>)
        .collect()
}

/// `n` succeeding stubs named `client-0..n`.
pub fn healthy_pool(n: usize) -> Vec<Arc<StubClient>> {
    (0..n).map(|i| StubClient::ok(format!("client-{}", i))).collect()
}
