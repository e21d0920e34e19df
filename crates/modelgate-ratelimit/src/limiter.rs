// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window counters keyed independently by origin address and identity.
//!
//! Each key gets a counter that starts on its first request and expires
//! `window` later. Address and identity maps are separate `DashMap`s so
//! contention on one key never blocks another, and no lock is ever held
//! across both maps.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use modelgate_config::model::{RateLimitConfig, RateLimitProfile};
use modelgate_core::GateError;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};

/// Which counter denied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LimitScope {
    Address,
    Identity,
}

/// Named limiter profiles from `[rate_limit.*]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LimiterProfile {
    Chat,
    Api,
    Payment,
    Newsletter,
}

impl LimiterProfile {
    pub fn select(self, config: &RateLimitConfig) -> RateLimitProfile {
        match self {
            LimiterProfile::Chat => config.chat,
            LimiterProfile::Api => config.api,
            LimiterProfile::Payment => config.payment,
            LimiterProfile::Newsletter => config.newsletter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Result of one admission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitOutcome {
    pub allowed: bool,
    pub reason: Option<String>,
    pub denied_by: Option<LimitScope>,
    /// Ceiling of the counter `remaining` refers to.
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Time until the denying counter resets. Only set on denial.
    #[serde(skip)]
    pub retry_after: Option<Duration>,
}

impl RateLimitOutcome {
    /// `X-RateLimit-*` response headers, plus `Retry-After` on denial.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset_at.timestamp().to_string()),
        ];
        if let Some(retry_after) = self.retry_after {
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            headers.push(("Retry-After", secs.to_string()));
        }
        headers
    }

    /// Turn a denial into [`GateError::RateLimited`].
    pub fn into_result(self) -> Result<Self, GateError> {
        if self.allowed {
            return Ok(self);
        }
        Err(GateError::RateLimited {
            reason: self.reason.unwrap_or_else(|| "rate limit exceeded".to_string()),
            retry_after: self.retry_after.unwrap_or_default(),
        })
    }
}

/// Unexpired entry counts per map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RateLimitStats {
    pub address_entries: usize,
    pub identity_entries: usize,
}

/// Dual-key rate limiter.
pub struct RateLimiter {
    profile: RateLimitProfile,
    address_window: TimeDelta,
    identity_window: TimeDelta,
    addresses: DashMap<String, WindowEntry>,
    identities: DashMap<String, WindowEntry>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("profile", &self.profile)
            .field("addresses", &self.addresses.len())
            .field("identities", &self.identities.len())
            .finish_non_exhaustive()
    }
}

fn window(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

fn expiry(now: DateTime<Utc>, window: TimeDelta) -> DateTime<Utc> {
    now.checked_add_signed(window)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Count one request against `key`, or return the full entry on denial.
fn admit(
    map: &DashMap<String, WindowEntry>,
    key: &str,
    limit: u32,
    window: TimeDelta,
    now: DateTime<Utc>,
) -> Result<WindowEntry, WindowEntry> {
    let mut entry = map.entry(key.to_owned()).or_insert(WindowEntry {
        count: 0,
        reset_at: expiry(now, window),
    });
    if now > entry.reset_at {
        entry.count = 0;
        entry.reset_at = expiry(now, window);
    }
    if entry.count >= limit {
        return Err(*entry);
    }
    entry.count += 1;
    Ok(*entry)
}

impl RateLimiter {
    pub fn new(profile: RateLimitProfile) -> Self {
        Self::with_clock(profile, Arc::new(SystemClock))
    }

    pub fn with_clock(profile: RateLimitProfile, clock: Arc<dyn Clock>) -> Self {
        Self {
            address_window: window(profile.address_window_secs),
            identity_window: window(profile.identity_window_secs),
            profile,
            addresses: DashMap::new(),
            identities: DashMap::new(),
            clock,
        }
    }

    /// Limiter for a named profile in `config`.
    pub fn from_profile(config: &RateLimitConfig, profile: LimiterProfile) -> Self {
        Self::new(profile.select(config))
    }

    pub fn profile(&self) -> RateLimitProfile {
        self.profile
    }

    /// Admit or deny one request.
    ///
    /// The address counter is checked first. An address denial leaves the
    /// identity counter untouched; an identity denial keeps the address
    /// increment, since the address did send a request.
    pub fn check(&self, address: &str, identity: &str) -> RateLimitOutcome {
        let now = self.clock.now();

        if let Err(entry) = admit(
            &self.addresses,
            address,
            self.profile.address_limit,
            self.address_window,
            now,
        ) {
            warn!(
                address,
                count = entry.count,
                limit = self.profile.address_limit,
                "address rate limit exceeded"
            );
            return self.denied(
                LimitScope::Address,
                self.profile.address_limit,
                self.profile.address_window_secs,
                entry,
                now,
            );
        }

        match admit(
            &self.identities,
            identity,
            self.profile.identity_limit,
            self.identity_window,
            now,
        ) {
            Ok(entry) => {
                debug!(
                    identity,
                    count = entry.count,
                    limit = self.profile.identity_limit,
                    "rate limit check passed"
                );
                RateLimitOutcome {
                    allowed: true,
                    reason: None,
                    denied_by: None,
                    limit: self.profile.identity_limit,
                    remaining: self.profile.identity_limit.saturating_sub(entry.count),
                    reset_at: entry.reset_at,
                    retry_after: None,
                }
            }
            Err(entry) => {
                warn!(
                    identity,
                    count = entry.count,
                    limit = self.profile.identity_limit,
                    "identity rate limit exceeded"
                );
                self.denied(
                    LimitScope::Identity,
                    self.profile.identity_limit,
                    self.profile.identity_window_secs,
                    entry,
                    now,
                )
            }
        }
    }

    fn denied(
        &self,
        scope: LimitScope,
        limit: u32,
        window_secs: u64,
        entry: WindowEntry,
        now: DateTime<Utc>,
    ) -> RateLimitOutcome {
        RateLimitOutcome {
            allowed: false,
            reason: Some(format!(
                "{scope} rate limit exceeded: {limit} requests per {window_secs}s"
            )),
            denied_by: Some(scope),
            limit,
            remaining: 0,
            reset_at: entry.reset_at,
            retry_after: Some((entry.reset_at - now).to_std().unwrap_or_default()),
        }
    }

    /// Requests left for `identity` in its current window. Does not count
    /// as a request.
    pub fn remaining_requests(&self, identity: &str) -> u32 {
        let now = self.clock.now();
        match self.identities.get(identity) {
            Some(entry) if now <= entry.reset_at => {
                self.profile.identity_limit.saturating_sub(entry.count)
            }
            _ => self.profile.identity_limit,
        }
    }

    /// When `identity`'s window resets; now if it has no counter.
    pub fn reset_time(&self, identity: &str) -> DateTime<Utc> {
        self.identities
            .get(identity)
            .map(|entry| entry.reset_at)
            .unwrap_or_else(|| self.clock.now())
    }

    /// Evict expired entries, one map at a time. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        for map in [&self.addresses, &self.identities] {
            let before = map.len();
            map.retain(|_, entry| now <= entry.reset_at);
            removed += before.saturating_sub(map.len());
        }
        removed
    }

    /// Drop every counter.
    pub fn reset(&self) {
        self.addresses.clear();
        self.identities.clear();
    }

    pub fn stats(&self) -> RateLimitStats {
        let now = self.clock.now();
        let active = |map: &DashMap<String, WindowEntry>| {
            map.iter().filter(|entry| now <= entry.reset_at).count()
        };
        RateLimitStats {
            address_entries: active(&self.addresses),
            identity_entries: active(&self.identities),
        }
    }

    /// Stored entry counts, expired ones included.
    pub fn entry_counts(&self) -> RateLimitStats {
        RateLimitStats {
            address_entries: self.addresses.len(),
            identity_entries: self.identities.len(),
        }
    }
}

/// Client address from `X-Forwarded-For` (first hop) or `X-Real-IP`,
/// or `"unknown"` when neither is present.
pub fn client_address(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    forwarded_for
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|v| !v.is_empty()))
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn profile(address_limit: u32, identity_limit: u32) -> RateLimitProfile {
        RateLimitProfile {
            address_limit,
            address_window_secs: 60,
            identity_limit,
            identity_window_secs: 60,
        }
    }

    fn limiter(address_limit: u32, identity_limit: u32) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let limiter = RateLimiter::with_clock(profile(address_limit, identity_limit), clock.clone());
        (limiter, clock)
    }

    #[test]
    fn identity_limit_denies_n_plus_one() {
        let (limiter, _) = limiter(100, 3);
        for i in 0..3 {
            let outcome = limiter.check("10.0.0.1", "alice");
            assert!(outcome.allowed, "request {i} should pass");
            assert_eq!(outcome.remaining, 2 - i);
        }
        let denied = limiter.check("10.0.0.1", "alice");
        assert!(!denied.allowed);
        assert_eq!(denied.denied_by, Some(LimitScope::Identity));
        assert!(denied.reason.unwrap().contains("rate limit exceeded"));
        assert_eq!(denied.remaining, 0);
    }

    #[test]
    fn address_denial_does_not_touch_identity_counter() {
        let (limiter, _) = limiter(1, 5);
        assert!(limiter.check("10.0.0.1", "alice").allowed);
        let denied = limiter.check("10.0.0.1", "bob");
        assert_eq!(denied.denied_by, Some(LimitScope::Address));
        assert_eq!(limiter.remaining_requests("bob"), 5);
        assert_eq!(limiter.stats().identity_entries, 1);
    }

    #[test]
    fn identity_denial_keeps_address_increment() {
        let (limiter, _) = limiter(3, 1);
        assert!(limiter.check("10.0.0.1", "alice").allowed);
        assert!(!limiter.check("10.0.0.1", "alice").allowed);
        // Two address hits recorded; the third request uses the last slot.
        assert!(limiter.check("10.0.0.1", "bob").allowed);
        let denied = limiter.check("10.0.0.1", "carol");
        assert_eq!(denied.denied_by, Some(LimitScope::Address));
    }

    #[test]
    fn window_expiry_resets_counter() {
        let (limiter, clock) = limiter(100, 1);
        assert!(limiter.check("a", "alice").allowed);
        assert!(!limiter.check("a", "alice").allowed);
        // Still inside the window at exactly reset time.
        clock.advance(Duration::from_secs(60));
        assert!(!limiter.check("a", "alice").allowed);
        clock.advance(Duration::from_millis(1));
        assert!(limiter.check("a", "alice").allowed);
    }

    #[test]
    fn remaining_requests_does_not_mutate() {
        let (limiter, _) = limiter(100, 4);
        assert_eq!(limiter.remaining_requests("alice"), 4);
        assert_eq!(limiter.remaining_requests("alice"), 4);
        limiter.check("a", "alice");
        assert_eq!(limiter.remaining_requests("alice"), 3);
        assert_eq!(limiter.remaining_requests("alice"), 3);
    }

    #[test]
    fn reset_time_defaults_to_now() {
        let (limiter, clock) = limiter(100, 4);
        assert_eq!(limiter.reset_time("nobody"), clock.now());
        limiter.check("a", "alice");
        assert_eq!(
            limiter.reset_time("alice"),
            clock.now() + TimeDelta::seconds(60)
        );
    }

    #[test]
    fn sweep_evicts_only_expired_entries() {
        let (limiter, clock) = limiter(100, 100);
        limiter.check("a", "alice");
        clock.advance(Duration::from_secs(30));
        limiter.check("b", "bob");
        clock.advance(Duration::from_secs(31));

        assert_eq!(limiter.stats(), RateLimitStats { address_entries: 1, identity_entries: 1 });
        assert_eq!(limiter.sweep(), 2);
        assert_eq!(limiter.entry_counts(), RateLimitStats { address_entries: 1, identity_entries: 1 });
    }

    #[test]
    fn reset_clears_both_maps() {
        let (limiter, _) = limiter(100, 100);
        limiter.check("a", "alice");
        limiter.reset();
        assert_eq!(limiter.entry_counts(), RateLimitStats::default());
    }

    #[test]
    fn denial_headers_include_retry_after() {
        let (limiter, clock) = limiter(100, 1);
        limiter.check("a", "alice");
        clock.advance(Duration::from_millis(20_500));
        let denied = limiter.check("a", "alice");
        let headers = denied.headers();
        assert!(headers.contains(&("X-RateLimit-Limit", "1".to_string())));
        assert!(headers.contains(&("X-RateLimit-Remaining", "0".to_string())));
        assert!(headers.contains(&("Retry-After", "40".to_string())));
    }

    #[test]
    fn allowed_headers_have_no_retry_after() {
        let (limiter, _) = limiter(100, 5);
        let headers = limiter.check("a", "alice").headers();
        assert_eq!(headers.len(), 3);
        assert!(headers.contains(&("X-RateLimit-Remaining", "4".to_string())));
    }

    #[test]
    #[tracing_test::traced_test]
    fn denials_are_logged() {
        let (limiter, _) = limiter(100, 1);
        limiter.check("a", "alice");
        limiter.check("a", "alice");
        assert!(logs_contain("identity rate limit exceeded"));
    }

    #[test]
    fn denial_converts_to_gate_error() {
        let (limiter, _) = limiter(100, 1);
        limiter.check("a", "alice");
        let err = limiter.check("a", "alice").into_result().unwrap_err();
        assert!(matches!(err, GateError::RateLimited { .. }));
        assert!(err.is_surfaced());
    }

    #[test]
    fn named_profiles_select_config_sections() {
        let config = RateLimitConfig::default();
        let api = RateLimiter::from_profile(&config, LimiterProfile::Api);
        assert_eq!(api.profile().address_limit, 20);
        let newsletter: LimiterProfile = "Newsletter".parse().unwrap();
        assert_eq!(newsletter.select(&config).identity_window_secs, 3600);
    }

    #[test]
    fn client_address_prefers_first_forwarded_hop() {
        assert_eq!(
            client_address(Some("203.0.113.7, 10.0.0.1"), Some("10.0.0.2")),
            "203.0.113.7"
        );
        assert_eq!(client_address(None, Some(" 10.0.0.2 ")), "10.0.0.2");
        assert_eq!(client_address(Some(""), None), "unknown");
        assert_eq!(client_address(None, None), "unknown");
    }
}
