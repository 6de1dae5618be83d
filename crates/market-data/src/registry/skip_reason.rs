//! Attempt tracking for orchestrator diagnostics.

use std::fmt;
use std::time::Duration;

/// Why a client was not called during a fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// Client is suspended after a recent failure.
    CoolingDown { remaining: Duration },

    /// Client was serving other requests and the pool was not oversubscribed.
    Busy { in_flight: usize },

    /// The request deadline ran out before the client could be tried.
    DeadlineExceeded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::CoolingDown { remaining } => {
                write!(f, "cooling down, {}s left", remaining.as_secs())
            }
            SkipReason::Busy { in_flight } => write!(f, "busy, {} in flight", in_flight),
            SkipReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Record of a single provider attempt during a fetch.
#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub provider_id: String,
    pub skipped: Option<SkipReason>,
    pub error: Option<String>,
    pub success: bool,
}

/// Every attempt made while serving one request, in order.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record_skip(&mut self, provider_id: impl Into<String>, reason: SkipReason) {
        self.attempts.push(ProviderAttempt {
            provider_id: provider_id.into(),
            skipped: Some(reason),
            error: None,
            success: false,
        });
    }

    pub fn record_error(&mut self, provider_id: impl Into<String>, error: impl Into<String>) {
        self.attempts.push(ProviderAttempt {
            provider_id: provider_id.into(),
            skipped: None,
            error: Some(error.into()),
            success: false,
        });
    }

    pub fn record_success(&mut self, provider_id: impl Into<String>) {
        self.attempts.push(ProviderAttempt {
            provider_id: provider_id.into(),
            skipped: None,
            error: None,
            success: true,
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| {
                if a.success {
                    format!("{}: SUCCESS", a.provider_id)
                } else if let Some(skip) = &a.skipped {
                    format!("{}: SKIPPED ({})", a.provider_id, skip)
                } else if let Some(err) = &a.error {
                    format!("{}: ERROR ({})", a.provider_id, err)
                } else {
                    format!("{}: UNKNOWN", a.provider_id)
                }
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Check if any provider succeeded.
    pub fn has_success(&self) -> bool {
        self.attempts.iter().any(|a| a.success)
    }

    /// Ids of the providers that were actually called, in call order.
    pub fn called(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|a| a.skipped.is_none())
            .map(|a| a.provider_id.as_str())
            .collect()
    }

    /// Get all skip reasons.
    pub fn skip_reasons(&self) -> Vec<(&str, &SkipReason)> {
        self.attempts
            .iter()
            .filter_map(|a| a.skipped.as_ref().map(|s| (a.provider_id.as_str(), s)))
            .collect()
    }

    /// Get all errors.
    pub fn errors(&self) -> Vec<(&str, &str)> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_ref().map(|e| (a.provider_id.as_str(), e.as_str())))
            .collect()
    }
}
