// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full request pipeline against mock collaborators.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use modelgate_config::ModelgateConfig;
use modelgate_core::{Complexity, GateError, StrategyKind, Tier};
use modelgate_gateway::{ChatRequest, RequestGateway};
use modelgate_ratelimit::{LimiterProfile, ManualClock};
use modelgate_test_utils::fixtures::{AUTUMN_POEM, coding_prompt, test_config};
use modelgate_test_utils::{MockEntitlementSource, MockUsageLedger};
use tokio_util::sync::CancellationToken;

struct Harness {
    gateway: RequestGateway,
    entitlement: Arc<MockEntitlementSource>,
    ledger: Arc<MockUsageLedger>,
}

fn harness_with(
    config: ModelgateConfig,
    entitlement: MockEntitlementSource,
    ledger: MockUsageLedger,
) -> Harness {
    let entitlement = Arc::new(entitlement);
    let ledger = Arc::new(ledger);
    let gateway = RequestGateway::new(&config, entitlement.clone(), ledger.clone());
    Harness {
        gateway,
        entitlement,
        ledger,
    }
}

fn harness(entitlement: MockEntitlementSource, ledger: MockUsageLedger) -> Harness {
    harness_with(test_config(), entitlement, ledger)
}

#[tokio::test]
async fn free_poem_routes_to_budget_tier_with_headers() {
    let h = harness(
        MockEntitlementSource::new().with_plan("ana", "free", 1.0),
        MockUsageLedger::new(),
    );

    let decision = h
        .gateway
        .handle(ChatRequest::new("ana", "10.0.0.1", AUTUMN_POEM))
        .await
        .unwrap();

    assert_eq!(decision.tiers.levels(), vec![1]);
    assert_eq!(decision.decision.tier, Tier::Budget);
    assert_eq!(decision.classification.complexity, Complexity::Simple);
    assert!(decision.quota.trial);
    assert_eq!(decision.quota.messages_remaining(), Some(10));
    assert!(decision.model_validation.is_some());
    assert!(decision.degraded.is_empty());

    let headers = decision.headers();
    let names: Vec<&str> = headers.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        names,
        vec!["X-RateLimit-Limit", "X-RateLimit-Remaining", "X-RateLimit-Reset"]
    );
    assert_eq!(h.entitlement.calls(), 1);
}

#[tokio::test]
async fn paid_plan_skips_trial_checks() {
    let h = harness(
        MockEntitlementSource::new().with_plan("ben", "vn_pro", 10.0),
        MockUsageLedger::new().with_messages("ben", 200, 5_000),
    );

    let decision = h
        .gateway
        .handle(ChatRequest::new("ben", "10.0.0.2", coding_prompt(600)))
        .await
        .unwrap();

    assert_eq!(decision.tiers.levels(), vec![1, 2, 3]);
    assert_eq!(decision.classification.complexity, Complexity::Complex);
    assert!(!decision.quota.trial);
    assert!(decision.model_validation.is_none());
    assert!(decision.tiers.contains(decision.decision.tier));
    assert_eq!(h.ledger.reads(), 0);
}

#[tokio::test]
async fn entitlement_outage_degrades_to_lowest_tier() {
    let entitlement = MockEntitlementSource::new().with_plan("cai", "vn_pro", 10.0);
    entitlement.fail(true);
    let h = harness(entitlement, MockUsageLedger::new());

    let decision = h
        .gateway
        .handle(ChatRequest::new("cai", "10.0.0.3", coding_prompt(600)))
        .await
        .unwrap();

    assert_eq!(decision.degraded, vec!["entitlement"]);
    assert_eq!(decision.plan.plan_code, "free");
    assert_eq!(decision.tiers.levels(), vec![1]);
    assert_eq!(decision.decision.tier, Tier::Budget);
}

#[tokio::test]
async fn ledger_outage_does_not_block_trial_user() {
    let ledger = MockUsageLedger::new().with_messages("dan", 10, 1);
    ledger.fail(true);
    let h = harness(MockEntitlementSource::new(), ledger);

    let decision = h
        .gateway
        .handle(ChatRequest::new("dan", "10.0.0.4", "hello there"))
        .await
        .unwrap();
    assert_eq!(decision.degraded, vec!["usage_ledger"]);
    assert!(decision.quota.collaborator_degraded);
}

#[tokio::test]
async fn tenth_trial_message_admitted_eleventh_denied() {
    let h = harness(
        MockEntitlementSource::new().with_plan("eve", "free", 0.5),
        MockUsageLedger::new().with_messages("eve", 9, 100),
    );

    let tenth = h
        .gateway
        .handle(ChatRequest::new("eve", "10.0.0.5", "hello again"))
        .await
        .unwrap();
    assert_eq!(tenth.quota.messages_remaining(), Some(1));

    let state = h
        .gateway
        .record_usage(
            "eve",
            &tenth.plan.plan_code,
            &tenth.decision.selected_model_id,
            120,
            0.0,
        )
        .await
        .unwrap();
    assert_eq!(state.messages_remaining, Some(0));

    let err = h
        .gateway
        .handle(ChatRequest::new("eve", "10.0.0.5", "one more"))
        .await
        .unwrap_err();
    match err {
        GateError::QuotaExhausted { reason } => {
            assert_eq!(
                reason,
                "Bạn đã sử dụng hết số tin nhắn miễn phí. Nâng cấp để tiếp tục chat."
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn thirty_first_request_from_one_address_is_denied() {
    let h = harness(MockEntitlementSource::new(), MockUsageLedger::new());

    for i in 0..30 {
        h.gateway
            .handle(ChatRequest::new(format!("user-{i}"), "203.0.113.9", "hi"))
            .await
            .unwrap();
    }
    let err = h
        .gateway
        .handle(ChatRequest::new("user-30", "203.0.113.9", "hi"))
        .await
        .unwrap_err();

    assert!(err.is_surfaced());
    assert!(err.retry_after_secs().is_some());
    match err {
        GateError::RateLimited { reason, .. } => {
            assert_eq!(reason, "address rate limit exceeded: 30 requests per 60s");
        }
        other => panic!("unexpected error: {other}"),
    }
    // Rate-limited requests never reach the entitlement source.
    assert_eq!(h.entitlement.calls(), 30);
}

#[tokio::test]
async fn profiles_use_separate_windows() {
    let h = harness(MockEntitlementSource::new(), MockUsageLedger::new());
    for _ in 0..3 {
        h.gateway
            .handle(
                ChatRequest::new("fin", "198.51.100.7", "subscribe me")
                    .with_profile(LimiterProfile::Newsletter),
            )
            .await
            .unwrap();
    }
    let denied = h
        .gateway
        .handle(
            ChatRequest::new("fin", "198.51.100.7", "subscribe me")
                .with_profile(LimiterProfile::Newsletter),
        )
        .await;
    assert!(matches!(denied, Err(GateError::RateLimited { .. })));

    // The chat window for the same caller is untouched.
    assert!(
        h.gateway
            .handle(ChatRequest::new("fin", "198.51.100.7", "hello"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn disallowed_trial_model_is_substituted() {
    let mut config = test_config();
    config.routing.force_model = Some("gpt-4o-mini".to_string());
    config.quota.trial_models = vec!["gemini-2.0-flash".to_string()];
    config.quota.fallback_model = "gemini-2.0-flash".to_string();
    let h = harness_with(config, MockEntitlementSource::new(), MockUsageLedger::new());

    let decision = h
        .gateway
        .handle(ChatRequest::new("gil", "10.0.0.8", "hello"))
        .await
        .unwrap();

    assert!(decision.model_adjusted());
    assert_eq!(decision.decision.selected_model_id, "gemini-2.0-flash");
    assert_eq!(decision.decision.provider_id, "google");
    assert!(decision.decision.reason.contains("gpt-4o-mini"));
    assert!(decision.decision.estimated_cost.is_some());
}

#[tokio::test]
async fn substitute_outside_catalog_uses_fallback_provider() {
    let mut config = test_config();
    config.routing.force_model = Some("gpt-4o-mini".to_string());
    config.routing.fallback_model = "local-tiny".to_string();
    config.routing.fallback_provider = "local".to_string();
    config.quota.trial_models = vec!["local-tiny".to_string()];
    config.quota.fallback_model = "local-tiny".to_string();
    let h = harness_with(config, MockEntitlementSource::new(), MockUsageLedger::new());

    let decision = h
        .gateway
        .handle(ChatRequest::new("gwen", "10.0.0.18", "hello"))
        .await
        .unwrap();

    assert!(decision.model_adjusted());
    assert_eq!(decision.decision.selected_model_id, "local-tiny");
    assert_eq!(decision.decision.provider_id, "local");
    assert!(decision.decision.estimated_cost.is_none());
    assert!(decision.decision.alternative_model_ids.is_empty());
}

#[tokio::test]
async fn override_to_uncatalogued_model_is_ignored() {
    let h = harness(
        MockEntitlementSource::new().with_plan("ida", "vn_basic", 5.0),
        MockUsageLedger::new(),
    );

    let decision = h
        .gateway
        .handle(ChatRequest::new("ida", "10.0.0.19", "/model totally-made-up hello there"))
        .await
        .unwrap();

    assert_ne!(decision.decision.selected_model_id, "totally-made-up");
    assert_ne!(decision.decision.provider_id, "unknown");
}

fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    ))
}

#[tokio::test]
async fn idle_histories_are_evicted() {
    let clock = manual_clock();
    let gateway = RequestGateway::with_clock(
        &test_config(),
        Arc::new(MockEntitlementSource::new()),
        Arc::new(MockUsageLedger::new()),
        clock.clone(),
    );

    for identity in ["ivo", "jan"] {
        gateway
            .handle(ChatRequest::new(identity, "10.0.0.20", "hello"))
            .await
            .unwrap();
    }
    assert_eq!(gateway.history_len(), 2);

    clock.advance(Duration::from_secs(1_800));
    gateway
        .handle(ChatRequest::new("jan", "10.0.0.20", "still here"))
        .await
        .unwrap();
    clock.advance(Duration::from_secs(1_801));

    assert_eq!(gateway.sweep_history(), 1);
    assert_eq!(gateway.history_len(), 1);
    assert_eq!(gateway.sweep_history(), 0);
}

#[tokio::test(start_paused = true)]
async fn chat_sweeper_evicts_idle_histories() {
    let clock = manual_clock();
    let gateway = RequestGateway::with_clock(
        &test_config(),
        Arc::new(MockEntitlementSource::new()),
        Arc::new(MockUsageLedger::new()),
        clock.clone(),
    );
    gateway
        .handle(ChatRequest::new("kai", "10.0.0.21", "hello"))
        .await
        .unwrap();
    assert_eq!(gateway.history_len(), 1);

    clock.advance(Duration::from_secs(3_600));
    let cancel = CancellationToken::new();
    let handles = gateway.spawn_sweepers(cancel.clone());
    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(gateway.history_len(), 0);

    cancel.cancel();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn reload_applies_new_strategy() {
    let h = harness(
        MockEntitlementSource::new().with_plan("hal", "vn_pro", 10.0),
        MockUsageLedger::new(),
    );
    let before = h
        .gateway
        .handle(ChatRequest::new("hal", "10.0.0.9", "hello"))
        .await
        .unwrap();
    assert_eq!(before.decision.strategy, StrategyKind::Weighted);

    let mut config = test_config();
    config.routing.strategy = StrategyKind::Affinity;
    h.gateway.reload(&config);

    let after = h
        .gateway
        .handle(ChatRequest::new("hal", "10.0.0.9", "hello"))
        .await
        .unwrap();
    assert_eq!(after.decision.strategy, StrategyKind::Affinity);
}

#[tokio::test(start_paused = true)]
async fn sweepers_stop_on_cancel() {
    let h = harness(MockEntitlementSource::new(), MockUsageLedger::new());
    let cancel = CancellationToken::new();
    let handles = h.gateway.spawn_sweepers(cancel.clone());
    assert_eq!(handles.len(), 4);

    tokio::time::advance(Duration::from_secs(600)).await;
    cancel.cancel();
    for handle in handles {
        handle.await.unwrap();
    }
}
