//! Finnhub quote provider.
//!
//! Fetches the live quote from `/quote` and, best-effort, the company news
//! sentiment from `/news-sentiment`. The sentiment score is bucketed with
//! [`Sentiment::from_score`].
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use num_traits::FromPrimitive;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::ProviderError;
use crate::models::{RawQuote, Sentiment};
use crate::provider::{http_client, QuoteProvider, DEFAULT_CALL_TIMEOUT};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// High price of the day
    h: Option<f64>,
    /// Low price of the day
    l: Option<f64>,
    /// Open price of the day
    o: Option<f64>,
}

/// Response from /news-sentiment endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsSentimentResponse {
    company_news_score: Option<f64>,
}

/// Error body
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

/// Finnhub fallback provider.
pub struct FinnhubClient {
    client: Client,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_timeout(api_key, DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout, "stockron/0.1"),
            api_key: api_key.into(),
        }
    }

    /// Make a GET request to the Finnhub API.
    async fn request(&self, endpoint: &str, symbol: &str) -> Result<String, ProviderError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        debug!("Finnhub request: {} for {}", endpoint, symbol);

        // API key as header rather than query param
        let response = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER_ID, &e))?;

        let status = response.status();

        // 403 means the key's quota is exhausted
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ProviderError::rate_limited(PROVIDER_ID));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::transport(
                PROVIDER_ID,
                "Invalid or missing API key",
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| format!("HTTP {} - {}", status, body));
            return Err(ProviderError::transport(PROVIDER_ID, message));
        }

        response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER_ID, &e))
    }

    fn parse_quote(symbol: &str, body: &str) -> Result<RawQuote, ProviderError> {
        let response: QuoteResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::invalid_response(
                PROVIDER_ID,
                format!("Failed to parse quote response: {}", e),
            )
        })?;

        let close = response.c.ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER_ID, format!("No quote data for {}", symbol))
        })?;

        // Finnhub returns zeros for unknown symbols instead of an error
        if close == 0.0 && response.o.unwrap_or(0.0) == 0.0 {
            return Err(ProviderError::invalid_response(
                PROVIDER_ID,
                format!("Symbol not found or no trading data: {}", symbol),
            ));
        }
        if close <= 0.0 || !close.is_finite() {
            return Err(ProviderError::invalid_response(
                PROVIDER_ID,
                format!("Non-positive price for {}: {}", symbol, close),
            ));
        }

        let price = Decimal::from_f64(close).ok_or_else(|| {
            ProviderError::invalid_response(PROVIDER_ID, format!("Invalid price: {}", close))
        })?;

        Ok(RawQuote {
            day_high: response.h.and_then(Decimal::from_f64),
            day_low: response.l.and_then(Decimal::from_f64),
            ..RawQuote::new(symbol.to_uppercase(), price)
        })
    }

    fn parse_sentiment(body: &str) -> Option<Sentiment> {
        serde_json::from_str::<NewsSentimentResponse>(body)
            .ok()
            .and_then(|r| r.company_news_score)
            .filter(|score| score.is_finite())
            .map(Sentiment::from_score)
    }

    async fn fetch_sentiment(&self, symbol: &str) -> Option<Sentiment> {
        match self.request("/news-sentiment", symbol).await {
            Ok(body) => Self::parse_sentiment(&body),
            Err(e) => {
                warn!("Finnhub sentiment unavailable for {}: {}", symbol, e);
                None
            }
        }
    }
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn fetch(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
        let body = self.request("/quote", symbol).await?;
        let mut quote = Self::parse_quote(symbol, &body)?;
        quote.sentiment = self.fetch_sentiment(symbol).await;
        Ok(quote)
    }
}
