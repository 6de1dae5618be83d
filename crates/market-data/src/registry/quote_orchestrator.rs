//! Quote orchestrator (the "Master Agent").
//!
//! Serves one quote per request from a pool of interchangeable clients:
//!
//! 1. Rotate through the pool from the shared cursor, skipping clients
//!    that are cooling down or were already tried for this request
//! 2. Call the chosen client once; any failure cools it down for a
//!    duration picked by the error's [`FailureKind`](crate::errors::FailureKind)
//! 3. Stop the sweep when every client has been tried or skipped, or when
//!    the request deadline runs out
//! 4. Call each fallback provider exactly once, in order
//! 5. Return the first success tagged with its source, or
//!    [`FetchError::AllProvidersFailed`]
//!
//! Fallback providers have no cooldown state: they are consulted only after
//! the pool is exhausted and are always considered available.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::client_pool::{ClientPool, ClientStatus};
use super::cooldown::CooldownPolicy;
use super::skip_reason::{FetchDiagnostics, SkipReason};
use super::validator::QuoteValidator;
use crate::errors::{FetchError, ProviderError};
use crate::models::{ProviderResult, RawQuote, Tier};
use crate::provider::{QuoteProvider, DEFAULT_CALL_TIMEOUT};

/// Default wall-clock budget for the primary sweep of one request.
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(30);

/// Orchestrator configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Cooldown durations applied to failing pool clients.
    pub cooldown: CooldownPolicy,
    /// Upper bound on any single provider call.
    pub call_timeout: Duration,
    /// Upper bound on the primary sweep of one request.
    pub request_deadline: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cooldown: CooldownPolicy::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            request_deadline: DEFAULT_REQUEST_DEADLINE,
        }
    }
}

/// Round-robin quote orchestrator with tiered fallback.
pub struct QuoteOrchestrator {
    pool: ClientPool,
    fallbacks: Vec<Arc<dyn QuoteProvider>>,
    config: OrchestratorConfig,
    validator: QuoteValidator,
}

impl QuoteOrchestrator {
    /// Create an orchestrator.
    ///
    /// # Arguments
    ///
    /// * `clients` - Interchangeable primary clients, in rotation order
    /// * `fallbacks` - Single-shot providers tried in order once the pool is exhausted
    /// * `config` - Cooldowns and timeouts
    pub fn new(
        clients: Vec<Arc<dyn QuoteProvider>>,
        fallbacks: Vec<Arc<dyn QuoteProvider>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            pool: ClientPool::new(clients, config.cooldown),
            fallbacks,
            config,
            validator: QuoteValidator::new(),
        }
    }

    /// Replace the default quote validator.
    pub fn with_validator(mut self, validator: QuoteValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn pool(&self) -> &ClientPool {
        &self.pool
    }

    /// Ids of the fallback tiers, in call order.
    pub fn fallback_ids(&self) -> Vec<&str> {
        self.fallbacks.iter().map(|p| p.id()).collect()
    }

    /// Status of every primary client.
    pub fn availability(&self) -> Vec<ClientStatus> {
        self.pool.availability()
    }

    /// Fetch a quote for `symbol`.
    ///
    /// The symbol is trimmed and upper-cased. Provider errors are logged and
    /// folded into the diagnostics; only the aggregate outcome is returned.
    pub async fn fetch(&self, symbol: &str) -> Result<ProviderResult, FetchError> {
        let symbol = normalize_symbol(symbol)?;
        let mut diagnostics = FetchDiagnostics::new();
        let mut last_error: Option<ProviderError> = None;

        if let Some(result) = self
            .fetch_primary(&symbol, &mut diagnostics, &mut last_error)
            .await
        {
            return Ok(result);
        }

        if let Some(result) = self
            .fetch_fallbacks(&symbol, &mut diagnostics, &mut last_error)
            .await
        {
            return Ok(result);
        }

        warn!(
            "All providers failed for {}. Diagnostics: {}",
            symbol,
            diagnostics.summary()
        );

        Err(FetchError::AllProvidersFailed {
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no provider available".to_string()),
            symbol,
            diagnostics,
        })
    }

    /// Sweep the pool once. Each client is called at most once.
    async fn fetch_primary(
        &self,
        symbol: &str,
        diagnostics: &mut FetchDiagnostics,
        last_error: &mut Option<ProviderError>,
    ) -> Option<ProviderResult> {
        let deadline = Instant::now() + self.config.request_deadline;
        let mut tried: HashSet<usize> = HashSet::with_capacity(self.pool.len());
        let mut deadline_hit = false;

        while tried.len() < self.pool.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                deadline_hit = true;
                break;
            }

            let Some(lease) = self.pool.select(&tried) else {
                break;
            };
            tried.insert(lease.index());

            let client = lease.client();
            let budget = self.config.call_timeout.min(remaining);
            debug!("Fetching {} from '{}'", symbol, client.id());

            match client.fetch(symbol, budget, &self.validator).await {
                Ok(quote) => {
                    diagnostics.record_success(client.id());
                    info!("Served {} from '{}'", symbol, client.id());
                    return Some(ProviderResult::new(client.id(), Tier::Primary, quote));
                }
                Err(e) => {
                    debug!("Client '{}' failed for {}: {}", client.id(), symbol, e);
                    diagnostics.record_error(client.id(), e.to_string());
                    *last_error = Some(e);
                }
            }
        }

        for (index, client) in self.pool.clients().iter().enumerate() {
            if tried.contains(&index) {
                continue;
            }
            if let Some(remaining) = client.cooldown().remaining() {
                diagnostics.record_skip(client.id(), SkipReason::CoolingDown { remaining });
            } else if deadline_hit {
                diagnostics.record_skip(client.id(), SkipReason::DeadlineExceeded);
            } else if client.in_flight() > 0 {
                let in_flight = client.in_flight();
                diagnostics.record_skip(client.id(), SkipReason::Busy { in_flight });
            }
        }

        None
    }

    /// Call each fallback tier exactly once, in order.
    async fn fetch_fallbacks(
        &self,
        symbol: &str,
        diagnostics: &mut FetchDiagnostics,
        last_error: &mut Option<ProviderError>,
    ) -> Option<ProviderResult> {
        if !self.fallbacks.is_empty() {
            info!("Primary clients exhausted for {}, switching to fallback tier", symbol);
        }

        for provider in &self.fallbacks {
            let provider_id = provider.id();
            debug!("Fetching {} from fallback '{}'", symbol, provider_id);

            match self.call_fallback(provider.as_ref(), symbol).await {
                Ok(quote) => {
                    diagnostics.record_success(provider_id);
                    info!("Served {} from fallback '{}'", symbol, provider_id);
                    return Some(ProviderResult::new(provider_id, Tier::Fallback, quote));
                }
                Err(e) => {
                    warn!("Fallback '{}' failed for {}: {}", provider_id, symbol, e);
                    diagnostics.record_error(provider_id, e.to_string());
                    *last_error = Some(e);
                }
            }
        }

        None
    }

    async fn call_fallback(
        &self,
        provider: &dyn QuoteProvider,
        symbol: &str,
    ) -> Result<RawQuote, ProviderError> {
        let quote = tokio::time::timeout(self.config.call_timeout, provider.fetch(symbol))
            .await
            .map_err(|_| ProviderError::timeout(provider.id()))??
            .sanitized();

        self.validator.validate(provider.id(), &quote)?;
        Ok(quote)
    }
}

/// Trim and upper-case a ticker, rejecting blanks.
pub fn normalize_symbol(symbol: &str) -> Result<String, FetchError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidSymbol(symbol.to_string()));
    }
    Ok(trimmed.to_uppercase())
}
