use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single headline from a news feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,

    #[serde(default)]
    pub url: String,

    /// Publication time as reported by the feed (RFC 2822 for RSS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,

    /// Human-readable feed name (e.g. "Yahoo Finance")
    pub source: String,

    /// Headline in the translator's target language, when translation succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline_translated: Option<String>,
}

/// Headlines for a symbol, as returned by the news orchestrator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsDigest {
    pub symbol: String,

    pub count: usize,

    pub items: Vec<NewsItem>,

    /// Provider that served the items; `None` when every provider failed
    pub source: Option<String>,

    pub fetched_at: DateTime<Utc>,
}

impl NewsDigest {
    pub fn new(symbol: impl Into<String>, source: impl Into<String>, items: Vec<NewsItem>) -> Self {
        Self {
            symbol: symbol.into(),
            count: items.len(),
            items,
            source: Some(source.into()),
            fetched_at: Utc::now(),
        }
    }

    /// Digest returned when no provider produced any headline.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            count: 0,
            items: Vec::new(),
            source: None,
            fetched_at: Utc::now(),
        }
    }
}
