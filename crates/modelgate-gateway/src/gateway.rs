// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request pipeline: admission, entitlement, quota, routing and trial
//! model adjustment for one chat request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use modelgate_config::ModelgateConfig;
use modelgate_core::{
    Classification, CollaboratorAdapter, EntitlementSource, GateError, PlanSnapshot, QueryHistory, QuotaState,
    RoutingDecision, TierSet, UsageLedger, UsageRecord, UserContext,
};
use modelgate_quota::{ModelValidation, QuotaCheck, QuotaTracker};
use modelgate_ratelimit::{
    Clock, LimiterProfile, RateLimitOutcome, RateLimiter, SystemClock, spawn_sweeper,
};
use modelgate_router::{AvailableModel, ModelRouter, RouteRequest, estimate_cost};
use strum::IntoEnumIterator;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::recording;

/// Collaborator label for entitlement lookups.
const ENTITLEMENT: &str = "entitlement";
/// Collaborator label for ledger reads.
const USAGE_LEDGER: &str = "usage_ledger";

/// One inbound chat request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub identity: String,
    /// Client address, see [`modelgate_ratelimit::client_address`].
    pub address: String,
    pub text: String,
    pub has_attachments: bool,
    pub profile: LimiterProfile,
    /// Models the caller can currently reach. Derived from the catalog when absent.
    pub available: Option<Vec<AvailableModel>>,
}

impl ChatRequest {
    pub fn new(
        identity: impl Into<String>,
        address: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            address: address.into(),
            text: text.into(),
            has_attachments: false,
            profile: LimiterProfile::Chat,
            available: None,
        }
    }

    pub fn with_attachments(mut self, has_attachments: bool) -> Self {
        self.has_attachments = has_attachments;
        self
    }

    pub fn with_profile(mut self, profile: LimiterProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_available(mut self, available: Vec<AvailableModel>) -> Self {
        self.available = Some(available);
        self
    }
}

/// Everything the gateway decided for an admitted request.
#[derive(Debug, Clone)]
pub struct GatewayDecision {
    pub decision: RoutingDecision,
    pub classification: Classification,
    pub tiers: TierSet,
    pub plan: PlanSnapshot,
    pub quota: QuotaCheck,
    /// Set when trial restrictions were evaluated against the selected model.
    pub model_validation: Option<ModelValidation>,
    pub rate_limit: RateLimitOutcome,
    /// Collaborators that failed and were replaced by degraded defaults.
    pub degraded: Vec<&'static str>,
}

impl GatewayDecision {
    /// Rate-limit response headers for the admitted request.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        self.rate_limit.headers()
    }

    pub fn model_adjusted(&self) -> bool {
        self.model_validation
            .as_ref()
            .is_some_and(|v| v.model_adjusted)
    }
}

/// Recent queries of one identity and when it was last seen.
#[derive(Debug, Clone)]
struct RecentQueries {
    last_seen: DateTime<Utc>,
    queries: QueryHistory,
}

/// Drop histories idle for `idle_secs` or longer. Returns how many were removed.
fn sweep_idle_history(
    history: &DashMap<String, RecentQueries>,
    now: DateTime<Utc>,
    idle_secs: i64,
) -> usize {
    let before = history.len();
    history.retain(|_, recent| (now - recent.last_seen).num_seconds() < idle_secs);
    before.saturating_sub(history.len())
}

/// The request gateway. Built once and shared by `Arc`.
pub struct RequestGateway {
    router: Arc<ModelRouter>,
    quota: Arc<QuotaTracker>,
    limiters: HashMap<LimiterProfile, Arc<RateLimiter>>,
    entitlement: Arc<dyn EntitlementSource>,
    history: Arc<DashMap<String, RecentQueries>>,
    history_capacity: usize,
    history_idle_secs: i64,
    clock: Arc<dyn Clock>,
    sweep_interval: Duration,
}

impl RequestGateway {
    pub fn new(
        config: &ModelgateConfig,
        entitlement: Arc<dyn EntitlementSource>,
        ledger: Arc<dyn UsageLedger>,
    ) -> Self {
        Self::with_clock(config, entitlement, ledger, Arc::new(SystemClock))
    }

    /// Build with an explicit clock for rate-limit windows and history idleness.
    pub fn with_clock(
        config: &ModelgateConfig,
        entitlement: Arc<dyn EntitlementSource>,
        ledger: Arc<dyn UsageLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let limiters = LimiterProfile::iter()
            .map(|profile| {
                let limiter =
                    RateLimiter::with_clock(profile.select(&config.rate_limit), clock.clone());
                (profile, Arc::new(limiter))
            })
            .collect();

        info!(
            name = %config.gateway.name,
            strategy = %config.routing.strategy,
            entitlement = entitlement.name(),
            ledger = ledger.name(),
            "request gateway initialized"
        );

        Self {
            router: Arc::new(ModelRouter::new(config)),
            quota: Arc::new(QuotaTracker::new(&config.quota, &config.tiers, ledger)),
            limiters,
            entitlement,
            history: Arc::new(DashMap::new()),
            history_capacity: config.gateway.history_capacity,
            history_idle_secs: i64::try_from(config.gateway.history_idle_secs).unwrap_or(i64::MAX),
            clock,
            sweep_interval: Duration::from_secs(config.rate_limit.sweep_interval_secs.max(1)),
        }
    }

    pub fn router(&self) -> &Arc<ModelRouter> {
        &self.router
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    pub fn limiter(&self, profile: LimiterProfile) -> Option<&Arc<RateLimiter>> {
        self.limiters.get(&profile)
    }

    /// Apply a new configuration to the routing tables and quota rules.
    ///
    /// Rate-limit windows keep their startup profiles.
    pub fn reload(&self, config: &ModelgateConfig) {
        self.router.reload(config);
        self.quota.reload(&config.quota, &config.tiers);
    }

    /// Run the full pipeline for one request.
    pub async fn handle(&self, request: ChatRequest) -> Result<GatewayDecision, GateError> {
        let rate_limit = self.admit(&request)?;
        let mut degraded = Vec::new();

        let plan = match self.entitlement.get_plan(&request.identity).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(
                    identity = %request.identity,
                    error = %e,
                    "entitlement lookup failed, using lowest tier and zero budget"
                );
                recording::record_collaborator_degraded(ENTITLEMENT);
                degraded.push(ENTITLEMENT);
                PlanSnapshot::degraded()
            }
        };

        let quota = self
            .quota
            .check_quota(&request.identity, &plan.plan_code)
            .await;
        if quota.collaborator_degraded {
            recording::record_collaborator_degraded(USAGE_LEDGER);
            degraded.push(USAGE_LEDGER);
        }
        if !quota.allowed {
            recording::record_quota_denied();
            debug!(identity = %request.identity, plan = %plan.plan_code, "request denied by quota");
            return Err(GateError::QuotaExhausted {
                reason: quota.reason.clone().unwrap_or_default(),
            });
        }

        let user = UserContext::new(
            request.identity.clone(),
            plan.plan_code.clone(),
            plan.remaining_budget,
            plan.preferred_model_ids.clone(),
            self.recent_queries(&request.identity),
        );

        let mut route = RouteRequest::new(&request.text, &user);
        route.has_attachments = request.has_attachments;
        route.available = request.available.as_deref();
        let outcome = self.router.route(&route);
        let mut decision = outcome.decision;

        let model_validation = if quota.trial {
            let validation = self
                .quota
                .validate_model_for_trial(&decision.selected_model_id, &plan.plan_code);
            if validation.model_adjusted {
                self.substitute_model(&mut decision, &validation);
            }
            Some(validation)
        } else {
            None
        };

        self.remember_query(&request.identity, &request.text);
        recording::record_routing_decision(decision.strategy, decision.fallback);
        info!(
            identity = %request.identity,
            plan = %plan.plan_code,
            model = %decision.selected_model_id,
            tier = %decision.tier,
            strategy = %decision.strategy,
            "request routed"
        );

        Ok(GatewayDecision {
            decision,
            classification: outcome.classification,
            tiers: outcome.tiers,
            plan,
            quota,
            model_validation,
            rate_limit,
            degraded,
        })
    }

    /// Account for a completed request. Returns the post-accounting quota state.
    pub async fn record_usage(
        &self,
        identity: &str,
        plan_code: &str,
        model_id: &str,
        tokens: u64,
        cost_usd: f64,
    ) -> Result<QuotaState, GateError> {
        self.quota
            .record_usage(identity, plan_code, UsageRecord::new(model_id, tokens, cost_usd))
            .await
    }

    /// Spawn one sweeper per limiter profile, publishing entry gauges after
    /// each pass. The chat sweeper also evicts idle query histories.
    pub fn spawn_sweepers(&self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        self.limiters
            .iter()
            .map(|(profile, limiter)| {
                let profile = *profile;
                let history = (profile == LimiterProfile::Chat).then(|| self.history.clone());
                let clock = self.clock.clone();
                let idle_secs = self.history_idle_secs;
                spawn_sweeper(
                    limiter.clone(),
                    self.sweep_interval,
                    cancel.clone(),
                    move |limiter| {
                        recording::set_rate_limit_entries(profile, limiter.entry_counts());
                        if let Some(history) = &history {
                            let removed = sweep_idle_history(history, clock.now(), idle_secs);
                            debug!(removed, remaining = history.len(), "idle query histories evicted");
                        }
                    },
                )
            })
            .collect()
    }

    /// Evict idle query histories now. Returns how many were removed.
    pub fn sweep_history(&self) -> usize {
        sweep_idle_history(&self.history, self.clock.now(), self.history_idle_secs)
    }

    /// Number of identities with a retained query history.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn admit(&self, request: &ChatRequest) -> Result<RateLimitOutcome, GateError> {
        let limiter = self.limiters.get(&request.profile).ok_or_else(|| {
            GateError::Internal(format!("no limiter for profile {}", request.profile))
        })?;
        let outcome = limiter.check(&request.address, &request.identity);
        if let Some(scope) = outcome.denied_by {
            recording::record_rate_limited(scope);
        }
        outcome.into_result()
    }

    fn substitute_model(&self, decision: &mut RoutingDecision, validation: &ModelValidation) {
        let tables = self.router.tables();
        let substitute = tables.catalog().get(&validation.model_id);
        decision.selected_model_id = validation.model_id.clone();
        if let Some(model) = substitute {
            decision.provider_id = model.provider_id.clone();
            decision.tier = model.tier;
        } else {
            warn!(model = %validation.model_id, "trial substitute is not in the catalog");
            decision.provider_id = if validation.model_id == tables.routing.fallback_model {
                tables.routing.fallback_provider.clone()
            } else {
                "unknown".to_string()
            };
            decision.tier = tables.tier_index.resolve(&validation.model_id);
        }
        decision.estimated_cost = substitute
            .zip(decision.estimated_tokens)
            .map(|(model, tokens)| estimate_cost(model, tokens));
        decision.alternative_model_ids.clear();
        if let Some(reason) = &validation.reason {
            decision.reason = reason.clone();
        }
    }

    fn recent_queries(&self, identity: &str) -> QueryHistory {
        self.history
            .get(identity)
            .map(|recent| recent.queries.clone())
            .unwrap_or_else(|| QueryHistory::with_capacity(self.history_capacity))
    }

    fn remember_query(&self, identity: &str, text: &str) {
        let now = self.clock.now();
        let mut recent = self
            .history
            .entry(identity.to_string())
            .or_insert_with(|| RecentQueries {
                last_seen: now,
                queries: QueryHistory::with_capacity(self.history_capacity),
            });
        recent.last_seen = now;
        recent.queries.push(text);
    }
}
