//! Per-client cooldown tracking.
//!
//! A client that fails is suspended until a deadline. There is no failure
//! counter and no half-open probing: once the deadline passes the client is
//! available again, and a new failure simply overwrites the deadline.
//!
//! Cooldowns are in-memory and reset on restart.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::warn;

use crate::errors::FailureKind;

/// Default suspension after a rate limit.
pub const DEFAULT_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(300);

/// Default suspension after a transient or invalid-response failure.
pub const DEFAULT_ERROR_COOLDOWN: Duration = Duration::from_secs(180);

/// Cooldown durations per failure kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CooldownPolicy {
    pub rate_limited: Duration,
    pub transient: Duration,
    pub invalid_response: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            rate_limited: DEFAULT_RATE_LIMIT_COOLDOWN,
            transient: DEFAULT_ERROR_COOLDOWN,
            invalid_response: DEFAULT_ERROR_COOLDOWN,
        }
    }
}

impl CooldownPolicy {
    /// Policy with one duration for rate limits and one for everything else.
    pub fn new(rate_limited: Duration, error: Duration) -> Self {
        Self {
            rate_limited,
            transient: error,
            invalid_response: error,
        }
    }

    pub fn cooldown_for(&self, kind: FailureKind) -> Duration {
        match kind {
            FailureKind::RateLimited => self.rate_limited,
            FailureKind::Transient => self.transient,
            FailureKind::InvalidResponse => self.invalid_response,
        }
    }
}

/// Availability deadline for a single client.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    until: Mutex<Option<Instant>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the deadline, recovering from poison if necessary.
    ///
    /// The guarded value is a plain `Option<Instant>`, which is always
    /// consistent even if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, Option<Instant>> {
        self.until.lock().unwrap_or_else(|poisoned| {
            warn!("Cooldown mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether the client may be called now. Has no side effects.
    pub fn is_available(&self) -> bool {
        self.is_available_at(Instant::now())
    }

    pub fn is_available_at(&self, now: Instant) -> bool {
        match *self.lock() {
            Some(until) => now >= until,
            None => true,
        }
    }

    /// Suspend the client for `duration` from now. Last write wins.
    pub fn set_cooldown(&self, duration: Duration) {
        let until = Instant::now() + duration;
        *self.lock() = Some(until);
    }

    /// Time left before the client becomes available, if it is cooling down.
    pub fn remaining(&self) -> Option<Duration> {
        let now = Instant::now();
        self.lock()
            .and_then(|until| until.checked_duration_since(now))
            .filter(|d| !d.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tracker_is_available() {
        let tracker = CooldownTracker::new();
        assert!(tracker.is_available());
        assert!(tracker.remaining().is_none());
    }

    #[test]
    fn test_cooldown_blocks_until_deadline() {
        let tracker = CooldownTracker::new();
        tracker.set_cooldown(Duration::from_secs(300));

        assert!(!tracker.is_available());
        assert!(tracker.is_available_at(Instant::now() + Duration::from_secs(301)));

        let remaining = tracker.remaining().unwrap();
        assert!(remaining > Duration::from_secs(290));
        assert!(remaining <= Duration::from_secs(300));
    }

    #[test]
    fn test_is_available_is_idempotent() {
        let tracker = CooldownTracker::new();
        tracker.set_cooldown(Duration::from_secs(60));

        let first = tracker.is_available();
        let second = tracker.is_available();
        assert_eq!(first, second);
        assert!(!second);
    }

    #[test]
    fn test_last_write_wins() {
        let tracker = CooldownTracker::new();
        tracker.set_cooldown(Duration::from_secs(300));
        tracker.set_cooldown(Duration::ZERO);

        assert!(tracker.is_available());
    }

    #[test]
    fn test_policy_lookup() {
        let policy = CooldownPolicy::default();
        assert_eq!(
            policy.cooldown_for(FailureKind::RateLimited),
            Duration::from_secs(300)
        );
        assert_eq!(
            policy.cooldown_for(FailureKind::Transient),
            Duration::from_secs(180)
        );
        assert_eq!(
            policy.cooldown_for(FailureKind::InvalidResponse),
            Duration::from_secs(180)
        );

        let custom = CooldownPolicy::new(Duration::from_secs(10), Duration::from_secs(5));
        assert_eq!(custom.cooldown_for(FailureKind::RateLimited), Duration::from_secs(10));
        assert_eq!(custom.cooldown_for(FailureKind::InvalidResponse), Duration::from_secs(5));
    }
}
