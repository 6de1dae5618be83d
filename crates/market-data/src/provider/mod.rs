//! Provider abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteProvider`, `NewsProvider` and `Translator` capability traits
//! - Concrete quote clients (Yahoo scraping sessions, Alpha Vantage, Finnhub)
//! - RSS headline clients (Yahoo Finance, MarketWatch, Google News)
//!
//! Clients only talk to their upstream and classify failures into
//! [`ProviderError`](crate::errors::ProviderError) variants. Cooldowns,
//! rotation and fallback live in the registry module.

mod traits;

pub mod alpha_vantage;
pub mod finnhub;
pub mod rss;
pub mod yahoo;

pub use traits::{NewsProvider, QuoteProvider, Translator};

use std::time::Duration;

/// Default per-call timeout for upstream requests.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Build an HTTP client with the given timeout and user agent.
///
/// Falls back to a default client if the builder fails.
pub(crate) fn http_client(timeout: Duration, user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
