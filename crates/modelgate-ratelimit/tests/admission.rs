// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admission scenarios against the default chat profile.

use std::sync::Arc;
use std::thread;

use modelgate_config::model::RateLimitConfig;
use modelgate_ratelimit::{LimitScope, LimiterProfile, RateLimiter};
use proptest::prelude::*;

fn chat_limiter() -> RateLimiter {
    RateLimiter::from_profile(&RateLimitConfig::default(), LimiterProfile::Chat)
}

#[test]
fn thirty_first_request_from_one_address_is_denied_for_address() {
    let limiter = chat_limiter();
    for i in 0..30 {
        let outcome = limiter.check("198.51.100.4", &format!("user-{i}"));
        assert!(outcome.allowed, "request {i} should pass");
    }
    let denied = limiter.check("198.51.100.4", "user-30");
    assert!(!denied.allowed);
    assert_eq!(denied.denied_by, Some(LimitScope::Address));
    assert_eq!(
        denied.reason.as_deref(),
        Some("address rate limit exceeded: 30 requests per 60s")
    );
}

#[test]
fn identity_limit_applies_across_addresses() {
    let limiter = chat_limiter();
    for i in 0..10 {
        assert!(limiter.check(&format!("10.0.0.{i}"), "alice").allowed);
    }
    let denied = limiter.check("10.0.0.99", "alice");
    assert_eq!(denied.denied_by, Some(LimitScope::Identity));
    assert!(denied.reason.unwrap().contains("rate limit exceeded"));
}

#[test]
fn concurrent_checks_never_exceed_identity_ceiling() {
    let limiter = Arc::new(chat_limiter());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let limiter = limiter.clone();
            thread::spawn(move || {
                (0..10)
                    .filter(|i| limiter.check(&format!("10.1.{t}.{i}"), "shared").allowed)
                    .count()
            })
        })
        .collect();
    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(admitted, 10);
}

proptest! {
    #[test]
    fn at_most_ceiling_admitted_per_identity(limit in 1u32..20, attempts in 1usize..60) {
        let mut config = RateLimitConfig::default();
        config.chat.identity_limit = limit;
        config.chat.address_limit = 1_000;
        let limiter = RateLimiter::from_profile(&config, LimiterProfile::Chat);

        let admitted = (0..attempts)
            .filter(|_| limiter.check("10.0.0.1", "alice").allowed)
            .count();
        prop_assert_eq!(admitted, attempts.min(limit as usize));
        prop_assert_eq!(
            limiter.remaining_requests("alice") as usize,
            limit as usize - admitted
        );
    }
}
