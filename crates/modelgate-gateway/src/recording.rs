// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade, so nothing is recorded until a recorder is
//! installed. The binary installs the Prometheus one when metrics are
//! enabled.

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use modelgate_core::{FallbackKind, GateError, StrategyKind};
use modelgate_ratelimit::{LimitScope, LimiterProfile, RateLimitStats};

/// Register all modelgate metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "modelgate_routing_decisions_total",
        "Routing decisions by strategy and fallback marker"
    );
    describe_counter!(
        "modelgate_rate_limited_total",
        "Requests denied by the rate limiter"
    );
    describe_counter!(
        "modelgate_quota_denied_total",
        "Requests denied for exhausted trial quota"
    );
    describe_counter!(
        "modelgate_collaborator_degraded_total",
        "Collaborator failures handled with degraded defaults"
    );
    describe_gauge!(
        "modelgate_rate_limit_entries",
        "Live rate-limit window entries per map"
    );
}

/// Install the Prometheus recorder globally and register descriptions.
///
/// Only one recorder can be installed per process.
pub fn install_prometheus() -> Result<PrometheusHandle, GateError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| GateError::Internal(format!("failed to install Prometheus recorder: {e}")))?;
    register_metrics();
    tracing::info!("prometheus metrics recorder installed");
    Ok(handle)
}

pub fn record_routing_decision(strategy: StrategyKind, fallback: FallbackKind) {
    metrics::counter!(
        "modelgate_routing_decisions_total",
        "strategy" => strategy.to_string(),
        "fallback" => fallback.to_string()
    )
    .increment(1);
}

pub fn record_rate_limited(scope: LimitScope) {
    metrics::counter!("modelgate_rate_limited_total", "scope" => scope.to_string()).increment(1);
}

pub fn record_quota_denied() {
    metrics::counter!("modelgate_quota_denied_total").increment(1);
}

pub fn record_collaborator_degraded(collaborator: &'static str) {
    metrics::counter!(
        "modelgate_collaborator_degraded_total",
        "collaborator" => collaborator
    )
    .increment(1);
}

/// Publish post-sweep entry counts for one limiter.
pub fn set_rate_limit_entries(profile: LimiterProfile, stats: RateLimitStats) {
    let profile = profile.to_string();
    metrics::gauge!(
        "modelgate_rate_limit_entries",
        "map" => "address",
        "profile" => profile.clone()
    )
    .set(stats.address_entries as f64);
    metrics::gauge!(
        "modelgate_rate_limit_entries",
        "map" => "identity",
        "profile" => profile
    )
    .set(stats.identity_entries as f64);
}
