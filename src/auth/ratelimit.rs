//! Login attempt throttling
//!
//! Failed logins are counted per client IP inside a sliding window. Once an IP
//! reaches `max_failures` it is refused outright for `block_duration`, before
//! any password work is done.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Configuration for the login rate limiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Failed logins tolerated inside one window
    pub max_failures: u32,

    /// How long an IP stays blocked
    pub block_duration: Duration,

    /// Length of the counting window
    pub window_duration: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_failures: 10,
            block_duration: Duration::from_secs(300),
            window_duration: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone)]
struct Attempts {
    failures: u32,
    window_start: Instant,
    blocked_until: Option<Instant>,
}

impl Attempts {
    fn fresh(now: Instant) -> Self {
        Self {
            failures: 0,
            window_start: now,
            blocked_until: None,
        }
    }

    fn is_blocked(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }

    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        !self.is_blocked(now) && now.duration_since(self.window_start) >= window
    }
}

/// Per-IP failed login counter
///
/// A poisoned lock is recovered rather than propagated; the map only holds
/// counters, so a panic elsewhere cannot leave it logically inconsistent.
///
/// `is_blocked` and `record_failure` are separate lock acquisitions. Logins
/// already past the check when the limit is reached still finish, so a burst
/// of concurrent attempts can overshoot `max_failures` by the number in
/// flight. The limiter throttles; it is not an exact quota.
pub struct RateLimiter {
    config: RateLimitConfig,
    attempts: RwLock<HashMap<IpAddr, Attempts>>,
}

impl RateLimiter {
    /// Create a rate limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Create a rate limiter with default configuration
    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    /// Record a failed login; returns `true` if the IP is now blocked
    pub fn record_failure(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut attempts = self
            .attempts
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = attempts.entry(ip).or_insert_with(|| Attempts::fresh(now));

        if entry.is_blocked(now) {
            return true;
        }
        if entry.blocked_until.is_some() || entry.is_stale(now, self.config.window_duration) {
            *entry = Attempts::fresh(now);
        }

        entry.failures += 1;
        if entry.failures >= self.config.max_failures {
            entry.blocked_until = Some(now + self.config.block_duration);
            return true;
        }

        false
    }

    /// Check if an IP is currently blocked
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        self.attempts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ip)
            .is_some_and(|entry| entry.is_blocked(now))
    }

    /// Forget an IP (after a successful login)
    pub fn reset(&self, ip: IpAddr) {
        self.attempts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&ip);
    }

    /// Failures counted for an IP in its current window
    pub fn failure_count(&self, ip: IpAddr) -> u32 {
        let now = Instant::now();
        self.attempts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ip)
            .filter(|entry| !entry.is_stale(now, self.config.window_duration))
            .map_or(0, |entry| entry.failures)
    }

    /// Drop entries whose window and block have both run out
    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.config.window_duration;
        self.attempts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, entry| !entry.is_stale(now, window));
    }

    /// Number of IPs currently tracked
    pub fn tracked_count(&self) -> usize {
        self.attempts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
