//! News orchestrator.
//!
//! Rotates across heterogeneous headline providers. Feeds are not
//! rate-limit guarded, so there is no cooldown state: each request tries
//! every provider at most once, starting from the shared cursor, and the
//! cursor moves forward by one whenever a request is served.
//!
//! Headlines can be post-processed by an optional [`Translator`]. A failed
//! translation keeps the original headline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};

use crate::errors::{ProviderError, TranslationError};
use crate::models::{NewsDigest, NewsItem};
use crate::provider::rss::DEFAULT_FEED_TIMEOUT;
use crate::provider::{NewsProvider, Translator};

/// Round-robin headline orchestrator.
pub struct NewsOrchestrator {
    providers: Vec<Arc<dyn NewsProvider>>,
    cursor: AtomicUsize,
    translator: Option<Arc<dyn Translator>>,
    call_timeout: Duration,
}

impl NewsOrchestrator {
    pub fn new(providers: Vec<Arc<dyn NewsProvider>>) -> Self {
        Self {
            providers,
            cursor: AtomicUsize::new(0),
            translator: None,
            call_timeout: DEFAULT_FEED_TIMEOUT,
        }
    }

    /// Translate every served headline with `translator`.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Fetch headlines for `symbol`.
    ///
    /// Never fails: when every provider errors or returns nothing, the
    /// digest is empty and has no source.
    pub async fn get_news(&self, symbol: &str) -> NewsDigest {
        let symbol = symbol.trim().to_uppercase();
        let n = self.providers.len();
        if symbol.is_empty() || n == 0 {
            return NewsDigest::empty(symbol);
        }

        let start = self.cursor.load(Ordering::SeqCst);

        for offset in 0..n {
            let provider = &self.providers[(start + offset) % n];

            match self.call(provider.as_ref(), &symbol).await {
                Ok(items) => {
                    self.cursor.fetch_add(1, Ordering::SeqCst);
                    info!(
                        "Served {} headlines for {} from '{}'",
                        items.len(),
                        symbol,
                        provider.id()
                    );
                    let items = self.translate_all(items).await;
                    return NewsDigest::new(symbol, provider.id(), items);
                }
                Err(e) => {
                    warn!("News provider '{}' failed for {}: {}", provider.id(), symbol, e);
                }
            }
        }

        warn!("No news provider returned headlines for {}", symbol);
        NewsDigest::empty(symbol)
    }

    async fn call(
        &self,
        provider: &dyn NewsProvider,
        symbol: &str,
    ) -> Result<Vec<NewsItem>, ProviderError> {
        let items = tokio::time::timeout(self.call_timeout, provider.fetch_news(symbol))
            .await
            .map_err(|_| ProviderError::timeout(provider.id()))??;

        if items.is_empty() {
            return Err(ProviderError::invalid_response(
                provider.id(),
                "No headlines returned",
            ));
        }

        Ok(items)
    }

    async fn translate_all(&self, items: Vec<NewsItem>) -> Vec<NewsItem> {
        let Some(translator) = self.translator.as_deref() else {
            return items;
        };

        join_all(items.into_iter().map(|item| translate_item(translator, item))).await
    }
}

async fn translate_item(translator: &dyn Translator, mut item: NewsItem) -> NewsItem {
    let translated = translator.translate(&item.headline).await.and_then(|text| {
        if text.trim().is_empty() {
            Err(TranslationError::Empty)
        } else {
            Ok(text)
        }
    });

    match translated {
        Ok(text) => item.headline_translated = Some(text),
        Err(e) => debug!(
            "{} translation failed for '{}': {}",
            translator.target_language(),
            item.headline,
            e
        ),
    }
    item
}
