//! Provider capability traits.
//!
//! Every upstream integration, whether a scraping session, a keyed REST API
//! or an RSS feed, is exposed through one of these traits. Each call has a
//! single suspension point (the network fetch) and never retries internally;
//! retry, rotation and backoff are the orchestrator's job.

use async_trait::async_trait;

use crate::errors::{ProviderError, TranslationError};
use crate::models::{NewsItem, RawQuote};

/// Trait for quote/fundamentals providers.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use stockron_market_data::provider::QuoteProvider;
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl QuoteProvider for MyProvider {
///     fn id(&self) -> &str {
///         "MY_PROVIDER"
///     }
///
///     async fn fetch(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
///         // one request, no retries
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Identity of this client, used as the `source` tag on results,
    /// in logs and in diagnostics. Must be unique within a pool.
    fn id(&self) -> &str;

    /// Fetch normalized quote data for an upper-cased symbol.
    async fn fetch(&self, symbol: &str) -> Result<RawQuote, ProviderError>;
}

/// Trait for headline providers.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Fetch recent headlines for a symbol, newest first as the feed orders them.
    async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>, ProviderError>;
}

/// Optional post-processing step applied to each headline.
#[async_trait]
pub trait Translator: Send + Sync {
    /// ISO 639-1 code of the language headlines are translated into.
    fn target_language(&self) -> &str;

    async fn translate(&self, text: &str) -> Result<String, TranslationError>;
}
