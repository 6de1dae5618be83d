//! Error types and failure classification for the market data crate.
//!
//! This module provides:
//! - [`ProviderError`]: a failure from a single provider call
//! - [`FailureKind`]: the classification that drives cooldown selection
//! - [`FetchError`]: the only error that crosses the orchestrator boundary
//! - [`TranslationError`]: a headline translation failure (always swallowed)

mod kind;

pub use kind::FailureKind;

use thiserror::Error;

use crate::registry::FetchDiagnostics;

/// Errors produced by a single provider call.
///
/// Each variant is classified into a [`FailureKind`] via [`kind`](Self::kind),
/// which determines how long the failing client is suspended.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The provider rate limited the request (HTTP 429 or an equivalent
    /// in-body quota message).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request did not complete within its per-call timeout.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The request could not be sent or the upstream returned a non-success
    /// status other than a rate limit.
    #[error("Request failed: {provider} - {message}")]
    Transport {
        /// The provider that failed
        provider: String,
        /// Description of the failure
        message: String,
    },

    /// The upstream answered but the payload was unusable.
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse {
        /// The provider that returned the payload
        provider: String,
        /// What was wrong with it
        message: String,
    },
}

impl ProviderError {
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>) -> Self {
        Self::Timeout {
            provider: provider.into(),
        }
    }

    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Map a reqwest error raised while sending or reading a request.
    pub fn from_reqwest(provider: impl Into<String>, err: &reqwest::Error) -> Self {
        let provider = provider.into();
        if err.is_timeout() {
            Self::Timeout { provider }
        } else if err.is_decode() {
            Self::InvalidResponse {
                provider,
                message: err.to_string(),
            }
        } else {
            Self::Transport {
                provider,
                message: err.to_string(),
            }
        }
    }

    /// Returns the failure classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use stockron_market_data::errors::{FailureKind, ProviderError};
    ///
    /// let error = ProviderError::rate_limited("YAHOO-1");
    /// assert_eq!(error.kind(), FailureKind::RateLimited);
    ///
    /// let error = ProviderError::timeout("FINNHUB");
    /// assert_eq!(error.kind(), FailureKind::Transient);
    /// ```
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Timeout { .. } | Self::Transport { .. } => FailureKind::Transient,
            Self::InvalidResponse { .. } => FailureKind::InvalidResponse,
        }
    }

    /// The provider that produced this error.
    pub fn provider(&self) -> &str {
        match self {
            Self::RateLimited { provider }
            | Self::Timeout { provider }
            | Self::Transport { provider, .. }
            | Self::InvalidResponse { provider, .. } => provider,
        }
    }
}

/// Errors returned by the quote orchestrator.
///
/// Individual provider errors never surface here directly; they are folded
/// into [`FetchError::AllProvidersFailed`] once every tier is exhausted.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The requested symbol was empty after trimming.
    #[error("Invalid symbol: '{0}'")]
    InvalidSymbol(String),

    /// Every primary client and every fallback tier failed.
    #[error("No data from any provider for {symbol} (last error: {last_error})")]
    AllProvidersFailed {
        /// The normalized symbol that was requested
        symbol: String,
        /// Message of the last underlying provider error
        last_error: String,
        /// Per-attempt record of the whole request
        diagnostics: FetchDiagnostics,
    },
}

impl FetchError {
    /// Diagnostics for a total failure, if any.
    pub fn diagnostics(&self) -> Option<&FetchDiagnostics> {
        match self {
            Self::AllProvidersFailed { diagnostics, .. } => Some(diagnostics),
            Self::InvalidSymbol(_) => None,
        }
    }
}

/// A failed headline translation.
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Translation service error: {0}")]
    Service(String),

    #[error("Translation returned empty text")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_kind() {
        let error = ProviderError::rate_limited("YAHOO-3");
        assert_eq!(error.kind(), FailureKind::RateLimited);
        assert_eq!(error.provider(), "YAHOO-3");
    }

    #[test]
    fn test_timeout_is_transient() {
        let error = ProviderError::timeout("ALPHA_VANTAGE");
        assert_eq!(error.kind(), FailureKind::Transient);
    }

    #[test]
    fn test_transport_is_transient() {
        let error = ProviderError::transport("FINNHUB", "HTTP 502 Bad Gateway");
        assert_eq!(error.kind(), FailureKind::Transient);
    }

    #[test]
    fn test_invalid_response_kind() {
        let error = ProviderError::invalid_response("YAHOO-1", "No historical data");
        assert_eq!(error.kind(), FailureKind::InvalidResponse);
    }

    #[test]
    fn test_error_display() {
        let error = ProviderError::rate_limited("YAHOO-2");
        assert_eq!(format!("{}", error), "Rate limited: YAHOO-2");

        let error = ProviderError::transport("ALPHA_VANTAGE", "HTTP 500");
        assert_eq!(
            format!("{}", error),
            "Request failed: ALPHA_VANTAGE - HTTP 500"
        );

        let error = FetchError::InvalidSymbol("  ".to_string());
        assert_eq!(format!("{}", error), "Invalid symbol: '  '");
    }

    #[test]
    fn test_aggregate_failure_is_distinct() {
        let error = FetchError::AllProvidersFailed {
            symbol: "NVDA".to_string(),
            last_error: "Rate limited: FINNHUB".to_string(),
            diagnostics: FetchDiagnostics::new(),
        };
        let message = error.to_string();
        assert!(message.starts_with("No data from any provider for NVDA"));
        assert!(message.contains("Rate limited: FINNHUB"));
        assert!(error.diagnostics().is_some());
    }
}
