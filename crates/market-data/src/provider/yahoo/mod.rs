//! Yahoo Finance scraping client.
//!
//! Each [`YahooClient`] is one independent session against Yahoo's
//! unofficial endpoints: it owns its own HTTP client, a distinct
//! User-Agent and its own cookie/crumb pair. The orchestrator spreads
//! requests across a pool of these so that a throttled session can be
//! parked while the others keep serving.

mod models;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use num_traits::FromPrimitive;
use reqwest::{header, StatusCode};
use rust_decimal::Decimal;
use tracing::{debug, warn};
use urlencoding::encode;
use yahoo_finance_api as yahoo;

use crate::errors::ProviderError;
use crate::models::RawQuote;
use crate::provider::{http_client, QuoteProvider, DEFAULT_CALL_TIMEOUT};

use models::{raw, YahooQuoteSummaryResponse, YahooQuoteSummaryResult};

const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const MODULES: &str = "price,summaryDetail,financialData,defaultKeyStatistics";

/// Days of daily history requested alongside fundamentals.
const HISTORY_DAYS: i64 = 180;

/// Browser families rotated across sessions. `{v}` is the major version.
const USER_AGENT_TEMPLATES: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{v}.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{v}.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:{v}.0) Gecko/20100101 Firefox/{v}.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:{v}.0) Gecko/20100101 Firefox/{v}.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{v}.0.0.0 Safari/537.36",
];

/// Lowest major version per browser family.
const BASE_VERSIONS: [usize; 5] = [120, 16, 120, 120, 120];

/// User-Agent for session `index`. The family cycles with the index and
/// the version steps once per full cycle, so no two sessions share one.
fn user_agent_for(index: usize) -> String {
    let family = index % USER_AGENT_TEMPLATES.len();
    let version = BASE_VERSIONS[family] + index / USER_AGENT_TEMPLATES.len();
    USER_AGENT_TEMPLATES[family].replace("{v}", &version.to_string())
}

/// Cached Yahoo authentication data for one session
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

/// One Yahoo Finance scraping session.
pub struct YahooClient {
    id: String,
    user_agent: String,
    client: reqwest::Client,
    crumb: RwLock<Option<CrumbData>>,
}

impl YahooClient {
    /// Create session number `index` (1-based) with the default timeout.
    pub fn new(index: usize) -> Self {
        Self::with_timeout(index, DEFAULT_CALL_TIMEOUT)
    }

    /// Create session number `index` (1-based) with a per-call timeout.
    pub fn with_timeout(index: usize, timeout: Duration) -> Self {
        let user_agent = user_agent_for(index);
        Self {
            id: format!("YAHOO-{}", index),
            client: http_client(timeout, &user_agent),
            user_agent,
            crumb: RwLock::new(None),
        }
    }

    /// Build a pool of `count` sessions numbered from 1.
    pub fn pool(count: usize, timeout: Duration) -> Vec<Self> {
        (1..=count)
            .map(|index| Self::with_timeout(index, timeout))
            .collect()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    // ========================================================================
    // Crumb/Cookie Authentication
    // ========================================================================

    fn read_crumb(&self) -> RwLockReadGuard<'_, Option<CrumbData>> {
        self.crumb.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_crumb(&self) -> RwLockWriteGuard<'_, Option<CrumbData>> {
        self.crumb.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ensure this session has a valid authentication crumb.
    async fn ensure_crumb(&self) -> Result<CrumbData, ProviderError> {
        if let Some(crumb) = self.read_crumb().as_ref() {
            return Ok(crumb.clone());
        }

        self.fetch_crumb().await
    }

    /// Fetch a new cookie and crumb for this session.
    async fn fetch_crumb(&self) -> Result<CrumbData, ProviderError> {
        // Step 1: Get cookie from fc.yahoo.com (the response status is irrelevant)
        let response = self
            .client
            .get(COOKIE_URL)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&self.id, &e))?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| {
                ProviderError::invalid_response(&self.id, "Failed to parse Yahoo cookie")
            })?;

        // Step 2: Get crumb using cookie
        let response = self
            .client
            .get(CRUMB_URL)
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&self.id, &e))?;

        check_status(&self.id, response.status())?;

        let crumb = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(&self.id, &e))?;

        if crumb.trim().is_empty() || crumb.contains('<') {
            return Err(ProviderError::invalid_response(&self.id, "Empty Yahoo crumb"));
        }

        let crumb_data = CrumbData {
            cookie,
            crumb: crumb.trim().to_string(),
        };
        *self.write_crumb() = Some(crumb_data.clone());
        debug!("{}: refreshed Yahoo crumb", self.id);

        Ok(crumb_data)
    }

    /// Clear the cached crumb (used when authentication fails)
    fn clear_crumb(&self) {
        *self.write_crumb() = None;
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    async fn fetch_summary(&self, symbol: &str) -> Result<YahooQuoteSummaryResult, ProviderError> {
        let crumb = self.ensure_crumb().await?;

        let url = format!(
            "{}/{}?modules={}&crumb={}",
            QUOTE_SUMMARY_URL,
            encode(symbol),
            MODULES,
            encode(&crumb.crumb)
        );

        let response = self
            .client
            .get(&url)
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&self.id, &e))?;

        let status = response.status();
        self.check_auth(status)?;
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::invalid_response(
                &self.id,
                format!("Quote not found for symbol: {}", symbol),
            ));
        }
        check_status(&self.id, status)?;

        let data: YahooQuoteSummaryResponse = response.json().await.map_err(|e| {
            ProviderError::invalid_response(
                &self.id,
                format!("Failed to parse quoteSummary response: {}", e),
            )
        })?;

        if let Some(error) = data.quote_summary.error {
            return Err(ProviderError::invalid_response(
                &self.id,
                error
                    .description
                    .or(error.code)
                    .unwrap_or_else(|| "quoteSummary error".to_string()),
            ));
        }

        data.quote_summary
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| {
                ProviderError::invalid_response(&self.id, format!("No quoteSummary for {}", symbol))
            })
    }

    /// Count daily bars over the last six months.
    ///
    /// Goes through this session's own client and crumb so the chart call
    /// carries the same identity as the quoteSummary call.
    async fn fetch_history_points(&self, symbol: &str) -> Result<usize, ProviderError> {
        let crumb = self.ensure_crumb().await?;
        let end = Utc::now();
        let start = end - chrono::Duration::days(HISTORY_DAYS);

        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d&crumb={}",
            CHART_URL,
            encode(symbol),
            start.timestamp(),
            end.timestamp(),
            encode(&crumb.crumb)
        );

        let response = self
            .client
            .get(&url)
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&self.id, &e))?;

        let status = response.status();
        self.check_auth(status)?;
        check_status(&self.id, status)?;

        let body: serde_json::Value = response.json().await.map_err(|e| {
            ProviderError::invalid_response(&self.id, format!("Failed to parse chart response: {}", e))
        })?;

        let quotes = yahoo::YResponse::from_json(body)
            .and_then(|chart| chart.quotes())
            .map_err(|e| classify_chart_error(&self.id, &e))?;
        if quotes.is_empty() {
            return Err(ProviderError::invalid_response(&self.id, "No historical data"));
        }

        Ok(quotes.len())
    }

    /// A 401 means the crumb went stale; drop it so the next call refreshes.
    fn check_auth(&self, status: StatusCode) -> Result<(), ProviderError> {
        if status == StatusCode::UNAUTHORIZED {
            self.clear_crumb();
            return Err(ProviderError::transport(
                &self.id,
                "Yahoo authentication expired",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
        debug!("{}: fetching fundamentals for {}", self.id, symbol);

        let summary = self.fetch_summary(symbol).await?;
        let mut quote = map_summary(&self.id, symbol, &summary)?;

        quote.history_points = self.fetch_history_points(symbol).await.map_err(|e| {
            warn!("{}: history unavailable for {}: {}", self.id, symbol, e);
            e
        })?;

        Ok(quote)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn check_status(provider: &str, status: StatusCode) -> Result<(), ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::rate_limited(provider));
    }
    if !status.is_success() {
        return Err(ProviderError::transport(provider, format!("HTTP {}", status)));
    }
    Ok(())
}

/// Classify an error raised while decoding chart data.
fn classify_chart_error(provider: &str, error: &yahoo::YahooError) -> ProviderError {
    match error {
        yahoo::YahooError::NoQuotes
        | yahoo::YahooError::NoResult
        | yahoo::YahooError::EmptyDataSet => {
            ProviderError::invalid_response(provider, "No historical data")
        }
        other => {
            let message = other.to_string();
            if message.contains("429") || message.to_lowercase().contains("too many requests") {
                ProviderError::rate_limited(provider)
            } else {
                ProviderError::invalid_response(provider, message)
            }
        }
    }
}

fn to_decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(Decimal::from_f64)
}

/// Map a quoteSummary result to the normalized quote.
///
/// The price comes from `financialData.currentPrice`, falling back to
/// `price.regularMarketPrice`. Everything else defaults to zero.
fn map_summary(
    provider: &str,
    symbol: &str,
    result: &YahooQuoteSummaryResult,
) -> Result<RawQuote, ProviderError> {
    let price = result.price.as_ref();
    let detail = result.summary_detail.as_ref();
    let financial = result.financial_data.as_ref();
    let stats = result.default_key_statistics.as_ref();

    let current_price = financial
        .and_then(|f| raw(&f.current_price))
        .or_else(|| price.and_then(|p| raw(&p.regular_market_price)))
        .and_then(|p| to_decimal(Some(p)))
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(|| {
            ProviderError::invalid_response(provider, format!("No price for {}", symbol))
        })?;

    let market_cap = detail
        .and_then(|d| raw(&d.market_cap))
        .or_else(|| price.and_then(|p| raw(&p.market_cap)));

    Ok(RawQuote {
        symbol: symbol.to_uppercase(),
        price: current_price,
        market_cap: to_decimal(market_cap).unwrap_or_default(),
        pe: detail.and_then(|d| raw(&d.trailing_pe)).unwrap_or_default(),
        eps_growth: stats
            .and_then(|s| raw(&s.earnings_quarterly_growth))
            .or_else(|| financial.and_then(|f| raw(&f.earnings_growth)))
            .unwrap_or_default(),
        revenue_growth: financial
            .and_then(|f| raw(&f.revenue_growth))
            .unwrap_or_default(),
        profit_margin: financial
            .and_then(|f| raw(&f.profit_margins))
            .unwrap_or_default(),
        return_on_equity: financial
            .and_then(|f| raw(&f.return_on_equity))
            .unwrap_or_default(),
        day_high: to_decimal(price.and_then(|p| raw(&p.regular_market_day_high))),
        day_low: to_decimal(price.and_then(|p| raw(&p.regular_market_day_low))),
        sentiment: None,
        history_points: 0,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use rust_decimal_macros::dec;

    fn parse(json: &str) -> YahooQuoteSummaryResult {
        let response: YahooQuoteSummaryResponse = serde_json::from_str(json).unwrap();
        response.quote_summary.result.unwrap().into_iter().next().unwrap()
    }

    #[test]
    fn test_map_summary_full() {
        let result = parse(
            r#"{"quoteSummary": {"result": [{
                "price": {
                    "regularMarketPrice": {"raw": 449.5},
                    "regularMarketDayHigh": {"raw": 455.0},
                    "regularMarketDayLow": {"raw": 440.25}
                },
                "summaryDetail": {
                    "marketCap": {"raw": 1100000000000},
                    "trailingPE": {"raw": 64.5}
                },
                "financialData": {
                    "currentPrice": {"raw": 450.0},
                    "revenueGrowth": {"raw": 1.22},
                    "profitMargins": {"raw": 0.5},
                    "returnOnEquity": {"raw": 0.75}
                },
                "defaultKeyStatistics": {
                    "earningsQuarterlyGrowth": {"raw": 5.25}
                }
            }], "error": null}}"#,
        );

        let quote = map_summary("YAHOO-1", "nvda", &result).unwrap();
        assert_eq!(quote.symbol, "NVDA");
        assert_eq!(quote.price, dec!(450));
        assert_eq!(quote.market_cap, dec!(1100000000000));
        assert_eq!(quote.pe, 64.5);
        assert_eq!(quote.eps_growth, 5.25);
        assert_eq!(quote.revenue_growth, 1.22);
        assert_eq!(quote.profit_margin, 0.5);
        assert_eq!(quote.return_on_equity, 0.75);
        assert_eq!(quote.day_high, Some(dec!(455)));
        assert_eq!(quote.day_low, Some(dec!(440.25)));
    }

    #[test]
    fn test_map_summary_falls_back_to_market_price() {
        let result = parse(
            r#"{"quoteSummary": {"result": [{
                "price": {"regularMarketPrice": {"raw": 101.5}, "marketCap": {"raw": 5000}}
            }]}}"#,
        );

        let quote = map_summary("YAHOO-2", "AMD", &result).unwrap();
        assert_eq!(quote.price, dec!(101.5));
        assert_eq!(quote.market_cap, dec!(5000));
        assert_eq!(quote.pe, 0.0);
        assert_eq!(quote.eps_growth, 0.0);
    }

    #[test]
    fn test_map_summary_without_price_is_invalid() {
        let result = parse(r#"{"quoteSummary": {"result": [{"summaryDetail": {"trailingPE": {}}}]}}"#);

        let error = map_summary("YAHOO-3", "AAPL", &result).unwrap_err();
        assert_eq!(error.kind(), FailureKind::InvalidResponse);
        assert_eq!(error.provider(), "YAHOO-3");
    }

    #[test]
    fn test_check_status() {
        assert!(check_status("YAHOO-1", StatusCode::OK).is_ok());
        assert_eq!(
            check_status("YAHOO-1", StatusCode::TOO_MANY_REQUESTS)
                .unwrap_err()
                .kind(),
            FailureKind::RateLimited
        );
        assert_eq!(
            check_status("YAHOO-1", StatusCode::BAD_GATEWAY)
                .unwrap_err()
                .kind(),
            FailureKind::Transient
        );
    }

    #[test]
    fn test_sessions_have_distinct_identity() {
        let pool = YahooClient::pool(10, Duration::from_secs(6));
        let ids: Vec<_> = pool.iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids[0], "YAHOO-1");
        assert_eq!(ids[9], "YAHOO-10");

        let agents: std::collections::HashSet<&str> =
            pool.iter().map(|c| c.user_agent()).collect();
        assert_eq!(agents.len(), 10);
        assert!(agents.iter().all(|ua| !ua.contains("{v}")));
    }

    #[test]
    fn test_user_agent_steps_version_per_cycle() {
        assert!(user_agent_for(1).contains("Safari/605.1.15"));
        assert!(user_agent_for(1).contains("Version/16.0"));
        assert!(user_agent_for(6).contains("Version/17.0"));
        assert!(user_agent_for(10).contains("Chrome/122.0.0.0"));
    }

    #[test]
    fn test_chart_rate_limit_is_classified() {
        let error = yahoo::YahooError::FetchFailed("429 Too Many Requests".to_string());
        let mapped = classify_chart_error("YAHOO-4", &error);
        assert_eq!(mapped.kind(), FailureKind::RateLimited);
        assert_eq!(mapped.provider(), "YAHOO-4");
    }

    #[test]
    fn test_chart_without_data_is_invalid() {
        for error in [yahoo::YahooError::NoQuotes, yahoo::YahooError::NoResult] {
            let mapped = classify_chart_error("YAHOO-1", &error);
            assert_eq!(mapped.kind(), FailureKind::InvalidResponse);
        }

        let error = yahoo::YahooError::FetchFailed("unexpected chart layout".to_string());
        assert_eq!(
            classify_chart_error("YAHOO-1", &error).kind(),
            FailureKind::InvalidResponse
        );
    }
}
