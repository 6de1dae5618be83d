//! Orchestration core.
//!
//! This module provides:
//! - Per-client cooldown tracking driven by failure kind
//! - A round-robin client pool with in-flight leases
//! - The quote orchestrator with tiered single-shot fallback
//! - The news orchestrator with optional headline translation
//! - Quote data validation and per-request diagnostics

mod client_pool;
mod cooldown;
mod news_orchestrator;
mod quote_orchestrator;
mod skip_reason;
mod validator;

pub use client_pool::{ClientLease, ClientPool, ClientStatus, PooledClient};
pub use cooldown::{
    CooldownPolicy, CooldownTracker, DEFAULT_ERROR_COOLDOWN, DEFAULT_RATE_LIMIT_COOLDOWN,
};
pub use news_orchestrator::NewsOrchestrator;
pub use quote_orchestrator::{
    normalize_symbol, OrchestratorConfig, QuoteOrchestrator, DEFAULT_REQUEST_DEADLINE,
};
pub use skip_reason::{FetchDiagnostics, ProviderAttempt, SkipReason};
pub use validator::{QuoteValidator, ValidationIssue, ValidationSeverity, ValidatorConfig};
