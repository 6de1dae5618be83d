//! Stockron Market Data Crate
//!
//! Fetches stock quotes, fundamentals and headlines from free or scraped
//! upstreams that throttle aggressively, by rotating across many
//! interchangeable clients and parking the ones that fail.
//!
//! # Overview
//!
//! - A pool of Yahoo Finance scraping sessions, each with its own identity
//! - Per-client cooldowns whose length depends on how the call failed
//! - Single-shot fallback tiers (Alpha Vantage, then Finnhub) once the pool
//!   is exhausted
//! - The same rotation applied to RSS headline feeds, with optional
//!   headline translation
//!
//! # Architecture
//!
//! ```text
//!                  +--------------------+
//!   symbol ------> | QuoteOrchestrator  |
//!                  +--------------------+
//!                     |              |
//!          (sweep once, round-robin) (pool exhausted)
//!                     v              v
//!            +----------------+   +------------------+
//!            |   ClientPool   |   | fallback tiers   |
//!            | YAHOO-1..N     |   | ALPHA_VANTAGE,   |
//!            | + cooldowns    |   | FINNHUB          |
//!            +----------------+   +------------------+
//!                     |              |
//!                     v              v
//!                  +--------------------+
//!                  |   ProviderResult   |  (quote + source tag)
//!                  +--------------------+
//! ```
//!
//! # Core Types
//!
//! - [`QuoteOrchestrator`] - Round-robin quote fetching with fallback
//! - [`NewsOrchestrator`] - Rotating headline fetching with translation
//! - [`RawQuote`] - Normalized quote and fundamentals
//! - [`ProviderResult`] - A quote tagged with the client that produced it
//! - [`FetchError`] - The only error crossing the orchestrator boundary

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;

pub use errors::{FailureKind, FetchError, ProviderError, TranslationError};

// Re-export all public types from models
pub use models::{NewsDigest, NewsItem, ProviderResult, RawQuote, Sentiment, Tier};

// Re-export provider types
pub use provider::alpha_vantage::AlphaVantageClient;
pub use provider::finnhub::FinnhubClient;
pub use provider::rss::{RssFeed, RssNewsClient};
pub use provider::yahoo::YahooClient;
pub use provider::{NewsProvider, QuoteProvider, Translator};

// Re-export registry types
pub use registry::{
    ClientStatus, CooldownPolicy, CooldownTracker, FetchDiagnostics, NewsOrchestrator,
    OrchestratorConfig, ProviderAttempt, QuoteOrchestrator, QuoteValidator, SkipReason,
};
