//! Market data models
//!
//! - `quote` - Normalized quote fields (RawQuote) and tagged results (ProviderResult)
//! - `news` - Headlines (NewsItem) and per-request digests (NewsDigest)

mod news;
mod quote;

pub use news::{NewsDigest, NewsItem};
pub use quote::{ProviderResult, RawQuote, Sentiment, Tier};
