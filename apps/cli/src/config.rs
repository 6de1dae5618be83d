//! Runtime configuration from the environment.

use std::str::FromStr;
use std::time::Duration;

use stockron_market_data::provider::rss::DEFAULT_NEWS_LIMIT;
use stockron_market_data::provider::DEFAULT_CALL_TIMEOUT;
use stockron_market_data::registry::{
    DEFAULT_ERROR_COOLDOWN, DEFAULT_RATE_LIMIT_COOLDOWN, DEFAULT_REQUEST_DEADLINE,
};
use stockron_market_data::{CooldownPolicy, OrchestratorConfig};

/// Default number of Yahoo scraping sessions.
pub const DEFAULT_YAHOO_CLIENTS: usize = 10;

#[derive(Clone, Debug)]
pub struct Config {
    pub yahoo_clients: usize,
    pub alpha_vantage_key: Option<String>,
    pub finnhub_key: Option<String>,
    pub rate_limit_cooldown: Duration,
    pub error_cooldown: Duration,
    pub call_timeout: Duration,
    pub request_deadline: Duration,
    pub news_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            yahoo_clients: DEFAULT_YAHOO_CLIENTS,
            alpha_vantage_key: None,
            finnhub_key: None,
            rate_limit_cooldown: DEFAULT_RATE_LIMIT_COOLDOWN,
            error_cooldown: DEFAULT_ERROR_COOLDOWN,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            request_deadline: DEFAULT_REQUEST_DEADLINE,
            news_limit: DEFAULT_NEWS_LIMIT,
        }
    }
}

impl Config {
    /// Read configuration from process environment variables.
    ///
    /// `.env` must already have been loaded by the caller.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secret = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            yahoo_clients: parse_or(&get, "STOCKRON_YAHOO_CLIENTS", defaults.yahoo_clients).max(1),
            alpha_vantage_key: secret("ALPHA_API_KEY").or_else(|| secret("ALPHAVANTAGE_KEY")),
            finnhub_key: secret("FINNHUB_API_KEY"),
            rate_limit_cooldown: Duration::from_secs(parse_or(
                &get,
                "STOCKRON_RATE_LIMIT_COOLDOWN_SECS",
                defaults.rate_limit_cooldown.as_secs(),
            )),
            error_cooldown: Duration::from_secs(parse_or(
                &get,
                "STOCKRON_ERROR_COOLDOWN_SECS",
                defaults.error_cooldown.as_secs(),
            )),
            call_timeout: Duration::from_millis(parse_or(
                &get,
                "STOCKRON_CALL_TIMEOUT_MS",
                defaults.call_timeout.as_millis() as u64,
            )),
            request_deadline: Duration::from_millis(parse_or(
                &get,
                "STOCKRON_REQUEST_DEADLINE_MS",
                defaults.request_deadline.as_millis() as u64,
            )),
            news_limit: parse_or(&get, "STOCKRON_NEWS_LIMIT", defaults.news_limit).max(1),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            cooldown: CooldownPolicy::new(self.rate_limit_cooldown, self.error_cooldown),
            call_timeout: self.call_timeout,
            request_deadline: self.request_deadline,
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value '{}' for {}, using {}", raw, key, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.yahoo_clients, 10);
        assert_eq!(config.rate_limit_cooldown, Duration::from_secs(300));
        assert_eq!(config.error_cooldown, Duration::from_secs(180));
        assert_eq!(config.call_timeout, Duration::from_secs(10));
        assert_eq!(config.request_deadline, Duration::from_secs(30));
        assert_eq!(config.news_limit, 8);
        assert!(config.alpha_vantage_key.is_none());
        assert!(config.finnhub_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("STOCKRON_YAHOO_CLIENTS", "3"),
            ("STOCKRON_RATE_LIMIT_COOLDOWN_SECS", "60"),
            ("STOCKRON_ERROR_COOLDOWN_SECS", "30"),
            ("STOCKRON_CALL_TIMEOUT_MS", "2500"),
            ("FINNHUB_API_KEY", "fh-key"),
        ]));

        assert_eq!(config.yahoo_clients, 3);
        assert_eq!(config.call_timeout, Duration::from_millis(2500));
        assert_eq!(config.finnhub_key.as_deref(), Some("fh-key"));

        let orchestrator = config.orchestrator_config();
        assert_eq!(orchestrator.cooldown.rate_limited, Duration::from_secs(60));
        assert_eq!(orchestrator.cooldown.transient, Duration::from_secs(30));
        assert_eq!(orchestrator.cooldown.invalid_response, Duration::from_secs(30));
    }

    #[test]
    fn test_alpha_vantage_key_alias() {
        let config = Config::from_lookup(lookup(&[("ALPHAVANTAGE_KEY", "av-key")]));
        assert_eq!(config.alpha_vantage_key.as_deref(), Some("av-key"));

        let config = Config::from_lookup(lookup(&[
            ("ALPHA_API_KEY", "primary"),
            ("ALPHAVANTAGE_KEY", "alias"),
        ]));
        assert_eq!(config.alpha_vantage_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("STOCKRON_YAHOO_CLIENTS", "lots"),
            ("STOCKRON_NEWS_LIMIT", "0"),
            ("FINNHUB_API_KEY", "   "),
        ]));
        assert_eq!(config.yahoo_clients, 10);
        assert_eq!(config.news_limit, 1);
        assert!(config.finnhub_key.is_none());
    }
}
