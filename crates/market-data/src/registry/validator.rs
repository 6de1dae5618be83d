//! Quote data validation.
//!
//! Checks each quote a provider returns before the orchestrator accepts it:
//! - A positive price below a sanity ceiling
//! - A non-negative market cap
//! - Best-effort fields that came back empty (warnings only)
//!
//! A hard failure is reported as [`ProviderError::InvalidResponse`], so the
//! client that produced it is cooled down like any other bad payload.

use log::warn;
use rust_decimal::Decimal;

use crate::errors::ProviderError;
use crate::models::RawQuote;

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Hard failure - reject quote, try next client.
    Hard,
    /// Soft warning - accept quote but log warning.
    Soft,
}

/// Validation result details.
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: ValidationSeverity,
    /// Description of the issue.
    pub message: String,
}

/// Quote validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Maximum allowed price value (for sanity check).
    pub max_price: Option<Decimal>,
    /// Whether to reject quotes with a negative market cap.
    pub reject_negative_market_cap: bool,
    /// Whether to warn when no PE ratio was reported.
    pub warn_on_missing_pe: bool,
    /// Whether to warn when no price history backs the quote.
    pub warn_on_missing_history: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_price: Some(Decimal::from(1_000_000_000i64)), // 1 billion as sanity check
            reject_negative_market_cap: true,
            warn_on_missing_pe: true,
            warn_on_missing_history: true,
        }
    }
}

/// Quote data validator.
#[derive(Clone, Debug, Default)]
pub struct QuoteValidator {
    config: ValidatorConfig,
}

impl QuoteValidator {
    /// Create a new validator with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with custom configuration.
    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Collect every issue found in a quote.
    pub fn issues(&self, quote: &RawQuote) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        self.validate_price(quote, &mut issues);
        self.validate_market_cap(quote, &mut issues);
        self.validate_optional_fields(quote, &mut issues);

        issues
    }

    /// Validate a quote returned by `provider`.
    ///
    /// Warnings are logged but do not cause rejection.
    pub fn validate(&self, provider: &str, quote: &RawQuote) -> Result<(), ProviderError> {
        let issues = self.issues(quote);

        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();

        if !errors.is_empty() {
            return Err(ProviderError::invalid_response(provider, errors.join("; ")));
        }

        for issue in issues.iter().filter(|i| i.severity == ValidationSeverity::Soft) {
            warn!(
                "Quote validation warning for {} from {}: {}",
                quote.symbol, provider, issue.message
            );
        }

        Ok(())
    }

    fn validate_price(&self, quote: &RawQuote, issues: &mut Vec<ValidationIssue>) {
        if !quote.is_populated() {
            let message = if quote.symbol.is_empty() {
                "Missing symbol".to_string()
            } else {
                format!("Non-positive price: {}", quote.price)
            };
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message,
            });
        }

        if let Some(max) = self.config.max_price {
            if quote.price > max {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Hard,
                    message: format!("Price {} exceeds sanity limit {}", quote.price, max),
                });
            }
        }
    }

    fn validate_market_cap(&self, quote: &RawQuote, issues: &mut Vec<ValidationIssue>) {
        if self.config.reject_negative_market_cap && quote.market_cap < Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Negative market cap: {}", quote.market_cap),
            });
        }
    }

    fn validate_optional_fields(&self, quote: &RawQuote, issues: &mut Vec<ValidationIssue>) {
        if self.config.warn_on_missing_pe && quote.pe == 0.0 {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: "No PE ratio reported".to_string(),
            });
        }

        if self.config.warn_on_missing_history && quote.history_points == 0 {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: "No price history".to_string(),
            });
        }
    }
}
