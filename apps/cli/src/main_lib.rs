use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stockron_market_data::provider::rss::DEFAULT_FEED_TIMEOUT;
use stockron_market_data::{
    AlphaVantageClient, FetchError, FinnhubClient, NewsDigest, NewsOrchestrator, NewsProvider,
    ProviderResult, QuoteOrchestrator, QuoteProvider, RssNewsClient, YahooClient,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::scoring::{score_quote, Scores, Stance};

pub struct AppState {
    pub quotes: QuoteOrchestrator,
    pub news: NewsOrchestrator,
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("STOCKRON_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stdout carries the JSON result, so logs go to stderr in both modes.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let primaries: Vec<Arc<dyn QuoteProvider>> =
        YahooClient::pool(config.yahoo_clients, config.call_timeout)
            .into_iter()
            .map(|client| Arc::new(client) as Arc<dyn QuoteProvider>)
            .collect();

    let mut fallbacks: Vec<Arc<dyn QuoteProvider>> = Vec::new();
    match &config.alpha_vantage_key {
        Some(key) => fallbacks.push(Arc::new(AlphaVantageClient::with_timeout(
            key.clone(),
            config.call_timeout,
        ))),
        None => tracing::warn!("ALPHA_API_KEY not set, Alpha Vantage fallback disabled"),
    }
    match &config.finnhub_key {
        Some(key) => fallbacks.push(Arc::new(FinnhubClient::with_timeout(
            key.clone(),
            config.call_timeout,
        ))),
        None => tracing::warn!("FINNHUB_API_KEY not set, Finnhub fallback disabled"),
    }

    let quotes = QuoteOrchestrator::new(primaries, fallbacks, config.orchestrator_config());
    tracing::info!(
        "Quote orchestrator ready: {} primary clients, fallbacks {:?}",
        quotes.pool().len(),
        quotes.fallback_ids()
    );

    let feed_timeout = config.call_timeout.min(DEFAULT_FEED_TIMEOUT);
    let feeds: Vec<Arc<dyn NewsProvider>> = RssNewsClient::all(feed_timeout, config.news_limit)
        .into_iter()
        .map(|client| Arc::new(client) as Arc<dyn NewsProvider>)
        .collect();
    let news = NewsOrchestrator::new(feeds).with_call_timeout(feed_timeout);

    Ok(AppState { quotes, news })
}

#[derive(Debug, Serialize)]
pub struct Analysis {
    pub ticker: String,
    pub scores: Scores,
    pub stance: Stance,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl Analysis {
    pub fn from_result(result: &ProviderResult) -> Self {
        let scores = score_quote(&result.quote);
        Self {
            ticker: result.quote.symbol.clone(),
            stance: Stance::from_overall(scores.overall_score),
            scores,
            source: result.source.clone(),
            timestamp: Utc::now(),
        }
    }
}

pub async fn run_quote(state: &AppState, symbol: &str) -> anyhow::Result<serde_json::Value> {
    let result = state.quotes.fetch(symbol).await?;
    Ok(serde_json::to_value(result)?)
}

pub async fn run_news(state: &AppState, symbol: &str) -> anyhow::Result<serde_json::Value> {
    let digest: NewsDigest = state.news.get_news(symbol).await;
    Ok(serde_json::to_value(digest)?)
}

pub async fn run_analyze(state: &AppState, symbol: &str) -> anyhow::Result<serde_json::Value> {
    let result = state.quotes.fetch(symbol).await?;
    let analysis = Analysis::from_result(&result);
    tracing::info!(
        "Analyzed {} via {}: overall {} ({:?})",
        analysis.ticker,
        analysis.source,
        analysis.scores.overall_score,
        analysis.stance
    );
    Ok(serde_json::to_value(analysis)?)
}

/// JSON body printed when a command fails.
///
/// A total provider failure also lists each provider error and skip.
pub fn error_body(error: &anyhow::Error, ticker: &str) -> serde_json::Value {
    let mut body = serde_json::json!({
        "error": error.to_string(),
        "ticker": ticker.trim().to_uppercase(),
        "timestamp": Utc::now(),
    });

    if let Some(diagnostics) = error.downcast_ref::<FetchError>().and_then(FetchError::diagnostics) {
        body["errors"] = diagnostics
            .errors()
            .into_iter()
            .map(|(provider, message)| serde_json::json!({ "provider": provider, "error": message }))
            .collect();
        body["skipped"] = diagnostics
            .skip_reasons()
            .into_iter()
            .map(|(provider, reason)| {
                serde_json::json!({ "provider": provider, "reason": reason.to_string() })
            })
            .collect();
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stockron_market_data::{FetchDiagnostics, RawQuote, SkipReason, Tier};

    #[test]
    fn test_analysis_from_result() {
        let quote = RawQuote {
            pe: 60.0,
            eps_growth: 1.5,
            revenue_growth: 1.2,
            market_cap: dec!(3000000000000),
            ..RawQuote::new("NVDA", dec!(450))
        };
        let result = ProviderResult::new("YAHOO-2", Tier::Primary, quote);

        let analysis = Analysis::from_result(&result);
        assert_eq!(analysis.ticker, "NVDA");
        assert_eq!(analysis.source, "YAHOO-2");
        assert_eq!(analysis.stance, Stance::Buy);

        let body = serde_json::to_value(&analysis).unwrap();
        assert_eq!(body["stance"], "Buy");
        assert_eq!(body["scores"]["overall_score"], 84.4);
    }

    #[test]
    fn test_error_body() {
        let error = anyhow::Error::new(FetchError::InvalidSymbol("  ".to_string()));
        let body = error_body(&error, " nvda ");
        assert_eq!(body["ticker"], "NVDA");
        assert!(body["error"].as_str().unwrap().len() > 0);
        assert!(body["timestamp"].is_string());
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_error_body_lists_provider_attempts() {
        let mut diagnostics = FetchDiagnostics::new();
        diagnostics.record_error("YAHOO-1", "Rate limited: YAHOO-1");
        diagnostics.record_skip("YAHOO-2", SkipReason::DeadlineExceeded);
        diagnostics.record_error("FINNHUB", "Timeout: FINNHUB");
        let error = anyhow::Error::new(FetchError::AllProvidersFailed {
            symbol: "NVDA".to_string(),
            last_error: "Timeout: FINNHUB".to_string(),
            diagnostics,
        });

        let body = error_body(&error, "NVDA");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
        assert_eq!(body["errors"][0]["provider"], "YAHOO-1");
        assert_eq!(body["errors"][1]["error"], "Timeout: FINNHUB");
        assert_eq!(body["skipped"][0]["reason"], "deadline exceeded");
    }

    #[test]
    fn test_build_state_without_keys_has_no_fallbacks() {
        let config = Config {
            yahoo_clients: 2,
            ..Config::default()
        };
        let state = build_state(&config).unwrap();
        assert_eq!(state.quotes.pool().len(), 2);
        assert!(state.quotes.fallback_ids().is_empty());
        assert_eq!(state.news.provider_ids().len(), 3);
    }

    #[test]
    fn test_build_state_fallback_order() {
        let config = Config {
            yahoo_clients: 1,
            alpha_vantage_key: Some("av".to_string()),
            finnhub_key: Some("fh".to_string()),
            ..Config::default()
        };
        let state = build_state(&config).unwrap();
        assert_eq!(state.quotes.fallback_ids(), vec!["ALPHA_VANTAGE", "FINNHUB"]);
    }
}
