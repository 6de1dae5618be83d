//! Alpha Vantage fundamentals provider.
//!
//! Uses the `OVERVIEW` endpoint, which returns company fundamentals as a
//! flat object of strings. Alpha Vantage has no live price on that
//! endpoint, so the 50-day moving average stands in for it.
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute and
//! signals throttling in the body (`Note` / `Information`) with HTTP 200.

use std::time::Duration;

use async_trait::async_trait;
use num_traits::FromPrimitive;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::ProviderError;
use crate::models::RawQuote;
use crate::provider::{http_client, QuoteProvider, DEFAULT_CALL_TIMEOUT};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Alpha Vantage fallback provider.
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
}

/// OVERVIEW response. The API returns many more fields than these.
#[derive(Debug, Default, Deserialize)]
struct CompanyOverviewResponse {
    #[serde(rename = "Symbol")]
    symbol: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    market_capitalization: Option<String>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<String>,
    #[serde(rename = "50DayMovingAverage")]
    moving_average_50: Option<String>,
    #[serde(rename = "QuarterlyEarningsGrowthYOY")]
    earnings_growth: Option<String>,
    #[serde(rename = "QuarterlyRevenueGrowthYOY")]
    revenue_growth: Option<String>,
    #[serde(rename = "ProfitMargin")]
    profit_margin: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM")]
    return_on_equity: Option<String>,
    #[serde(rename = "52WeekHigh")]
    week_52_high: Option<String>,
    #[serde(rename = "52WeekLow")]
    week_52_low: Option<String>,

    // Error handling
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

impl AlphaVantageClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_timeout(api_key, DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout, "stockron/0.1"),
            api_key: api_key.into(),
        }
    }

    async fn request(&self, params: &[(&str, &str)]) -> Result<String, ProviderError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", &self.api_key));

        let url = reqwest::Url::parse_with_params(BASE_URL, &all_params).map_err(|e| {
            ProviderError::transport(PROVIDER_ID, format!("Failed to build URL: {}", e))
        })?;

        debug!(
            "Alpha Vantage request: {}",
            url.as_str().replace(&self.api_key, "***")
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER_ID, &e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::rate_limited(PROVIDER_ID));
        }
        if !status.is_success() {
            return Err(ProviderError::transport(
                PROVIDER_ID,
                format!("HTTP {}", status),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER_ID, &e))
    }

    /// Check for API-level errors embedded in a 200 response.
    fn check_api_error(overview: &CompanyOverviewResponse) -> Result<(), ProviderError> {
        if let Some(ref msg) = overview.error_message {
            return Err(ProviderError::invalid_response(PROVIDER_ID, msg.clone()));
        }

        // "Note" and "Information" carry the throttling message
        for msg in [&overview.note, &overview.information].into_iter().flatten() {
            if is_rate_limit_message(msg) {
                return Err(ProviderError::rate_limited(PROVIDER_ID));
            }
            warn!("Alpha Vantage notice: {}", msg);
        }

        Ok(())
    }

    /// Parse an OVERVIEW body into a normalized quote.
    fn parse_overview(symbol: &str, body: &str) -> Result<RawQuote, ProviderError> {
        let overview: CompanyOverviewResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::invalid_response(PROVIDER_ID, format!("Failed to parse OVERVIEW: {}", e))
        })?;

        Self::check_api_error(&overview)?;

        let resolved = overview
            .symbol
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ProviderError::invalid_response(
                    PROVIDER_ID,
                    format!("No overview data for {}", symbol),
                )
            })?;

        let price = parse_decimal(&overview.moving_average_50)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| {
                ProviderError::invalid_response(PROVIDER_ID, format!("No price for {}", symbol))
            })?;

        Ok(RawQuote {
            symbol: resolved.to_uppercase(),
            price,
            market_cap: parse_decimal(&overview.market_capitalization).unwrap_or_default(),
            pe: parse_f64(&overview.pe_ratio),
            eps_growth: parse_f64(&overview.earnings_growth),
            revenue_growth: parse_f64(&overview.revenue_growth),
            profit_margin: parse_f64(&overview.profit_margin),
            return_on_equity: parse_f64(&overview.return_on_equity),
            day_high: parse_decimal(&overview.week_52_high),
            day_low: parse_decimal(&overview.week_52_low),
            sentiment: None,
            history_points: 0,
        })
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageClient {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn fetch(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
        let body = self
            .request(&[("function", "OVERVIEW"), ("symbol", symbol)])
            .await?;
        Self::parse_overview(symbol, &body)
    }
}

fn is_rate_limit_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("api call frequency") || lower.contains("rate limit")
}

/// Parse an Alpha Vantage numeric string, treating "None", "-" and blanks as zero.
fn parse_f64(s: &Option<String>) -> f64 {
    s.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "None" && *v != "-")
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or_default()
}

fn parse_decimal(s: &Option<String>) -> Option<Decimal> {
    s.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "None" && *v != "-")
        .and_then(|v| v.parse::<f64>().ok())
        .and_then(Decimal::from_f64)
}
