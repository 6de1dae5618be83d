use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Coarse news sentiment attached by providers that expose a sentiment score.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Scores above this value are positive, below its negation negative.
    pub const THRESHOLD: f64 = 0.3;

    /// Bucket a company news score into a sentiment label.
    pub fn from_score(score: f64) -> Self {
        if score > Self::THRESHOLD {
            Self::Positive
        } else if score < -Self::THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// Normalized quote and fundamentals returned by any quote provider.
///
/// Only `symbol` and `price` are required. Every other numeric field is
/// best-effort and defaults to zero when the provider does not report it,
/// so downstream arithmetic never sees a missing value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    /// Upper-cased ticker symbol
    pub symbol: String,

    /// Current (or best available) price
    pub price: Decimal,

    /// Market capitalization in quote currency
    #[serde(default)]
    pub market_cap: Decimal,

    /// Trailing price/earnings ratio
    #[serde(default)]
    pub pe: f64,

    /// Quarterly earnings growth, year over year (0.12 = 12%)
    #[serde(default)]
    pub eps_growth: f64,

    /// Revenue growth, year over year (0.12 = 12%)
    #[serde(default)]
    pub revenue_growth: f64,

    /// Net profit margin (0.25 = 25%)
    #[serde(default)]
    pub profit_margin: f64,

    /// Return on equity (0.30 = 30%)
    #[serde(default)]
    pub return_on_equity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_high: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_low: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,

    /// Number of daily bars backing the quote (0 when the provider has none)
    #[serde(default)]
    pub history_points: usize,
}

impl RawQuote {
    /// Create a quote with only the required fields set.
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            ..Default::default()
        }
    }

    /// Whether the quote carries a usable price.
    pub fn is_populated(&self) -> bool {
        !self.symbol.is_empty() && self.price > Decimal::ZERO
    }

    /// Replace non-finite ratios with the neutral value.
    pub fn sanitized(mut self) -> Self {
        for value in [
            &mut self.pe,
            &mut self.eps_growth,
            &mut self.revenue_growth,
            &mut self.profit_margin,
            &mut self.return_on_equity,
        ] {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
        self
    }
}

/// Which tier of the orchestrator produced a result.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// One of the round-robin pool clients
    Primary,
    /// A single-shot fallback provider
    Fallback,
}

/// A quote tagged with the identity of the client that produced it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Client or provider identity (e.g. "YAHOO-4", "ALPHA_VANTAGE")
    pub source: String,

    pub tier: Tier,

    pub quote: RawQuote,

    pub fetched_at: DateTime<Utc>,
}

impl ProviderResult {
    pub fn new(source: impl Into<String>, tier: Tier, quote: RawQuote) -> Self {
        Self {
            source: source.into(),
            tier,
            quote,
            fetched_at: Utc::now(),
        }
    }
}
