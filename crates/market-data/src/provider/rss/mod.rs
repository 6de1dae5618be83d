//! RSS headline providers.
//!
//! Three free feeds expose the same RSS 2.0 shape, so a single client type
//! parameterized by [`RssFeed`] covers all of them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use urlencoding::encode;

use crate::errors::ProviderError;
use crate::models::NewsItem;
use crate::provider::{http_client, NewsProvider};

/// Default number of headlines kept per feed.
pub const DEFAULT_NEWS_LIMIT: usize = 8;

/// Default per-call timeout for feed requests.
pub const DEFAULT_FEED_TIMEOUT: Duration = Duration::from_secs(6);

const USER_AGENT: &str = "Mozilla/5.0 (compatible; stockron/0.1; +rss)";

/// Supported headline feeds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RssFeed {
    YahooFinance,
    MarketWatch,
    GoogleNews,
}

impl RssFeed {
    /// All feeds, in default rotation order.
    pub const ALL: [RssFeed; 3] = [
        RssFeed::YahooFinance,
        RssFeed::MarketWatch,
        RssFeed::GoogleNews,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            RssFeed::YahooFinance => "YAHOO_RSS",
            RssFeed::MarketWatch => "MARKETWATCH_RSS",
            RssFeed::GoogleNews => "GOOGLE_NEWS_RSS",
        }
    }

    /// Label stamped on each item's `source`.
    pub fn display_name(&self) -> &'static str {
        match self {
            RssFeed::YahooFinance => "Yahoo Finance",
            RssFeed::MarketWatch => "MarketWatch",
            RssFeed::GoogleNews => "Google News",
        }
    }

    pub fn url(&self, symbol: &str) -> String {
        match self {
            RssFeed::YahooFinance => format!(
                "https://feeds.finance.yahoo.com/rss/2.0/headline?s={}&region=US&lang=en-US",
                encode(symbol)
            ),
            RssFeed::MarketWatch => format!(
                "https://feeds.marketwatch.com/marketwatch/stock/{}",
                encode(symbol)
            ),
            RssFeed::GoogleNews => {
                // Index and share-class punctuation confuses the search query
                let query: String = symbol.chars().filter(|c| *c != '^' && *c != '.').collect();
                format!(
                    "https://news.google.com/rss/search?q={}+stock",
                    encode(&query)
                )
            }
        }
    }
}

// ============================================================================
// RSS 2.0 document
// ============================================================================

#[derive(Debug, Deserialize)]
struct RssDocument {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Headline client for one RSS feed.
pub struct RssNewsClient {
    feed: RssFeed,
    client: Client,
    limit: usize,
}

impl RssNewsClient {
    pub fn new(feed: RssFeed) -> Self {
        Self::with_options(feed, DEFAULT_FEED_TIMEOUT, DEFAULT_NEWS_LIMIT)
    }

    pub fn with_options(feed: RssFeed, timeout: Duration, limit: usize) -> Self {
        Self {
            feed,
            client: http_client(timeout, USER_AGENT),
            limit,
        }
    }

    /// One client per supported feed, in default rotation order.
    pub fn all(timeout: Duration, limit: usize) -> Vec<Self> {
        RssFeed::ALL
            .iter()
            .map(|feed| Self::with_options(*feed, timeout, limit))
            .collect()
    }

    /// Parse an RSS document into at most `limit` headlines.
    fn parse(&self, body: &str) -> Result<Vec<NewsItem>, ProviderError> {
        let document: RssDocument = quick_xml::de::from_str(body).map_err(|e| {
            ProviderError::invalid_response(self.feed.id(), format!("Malformed RSS: {}", e))
        })?;

        let items: Vec<NewsItem> = document
            .channel
            .items
            .into_iter()
            .filter_map(|item| {
                let headline = item.title.map(|t| t.trim().to_string())?;
                if headline.is_empty() {
                    return None;
                }
                Some(NewsItem {
                    headline,
                    url: item.link.map(|l| l.trim().to_string()).unwrap_or_default(),
                    published_at: item.pub_date.map(|d| d.trim().to_string()),
                    source: self.feed.display_name().to_string(),
                    headline_translated: None,
                })
            })
            .take(self.limit)
            .collect();

        if items.is_empty() {
            return Err(ProviderError::invalid_response(
                self.feed.id(),
                "Feed has no headlines",
            ));
        }

        Ok(items)
    }
}

#[async_trait]
impl NewsProvider for RssNewsClient {
    fn id(&self) -> &str {
        self.feed.id()
    }

    async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>, ProviderError> {
        let url = self.feed.url(symbol);
        debug!("{}: fetching {}", self.feed.id(), url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(self.feed.id(), &e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::rate_limited(self.feed.id()));
        }
        if !status.is_success() {
            return Err(ProviderError::transport(
                self.feed.id(),
                format!("HTTP {}", status),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(self.feed.id(), &e))?;

        self.parse(&body)
    }
}
