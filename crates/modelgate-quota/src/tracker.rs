// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trial quota enforcement.
//!
//! Trial identities get a hard message ceiling and a hard cumulative token
//! ceiling, both computed by summing the usage ledger. Paid plans bypass
//! every ceiling and model restriction; that check runs before the ledger
//! is touched. Ledger outages never block a trial user: usage is assumed
//! to be zero and the result is flagged as degraded.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use dashmap::DashMap;
use modelgate_config::model::{QuotaConfig, QuotaLocale, TiersConfig};
use modelgate_core::{GateError, QuotaState, UsageLedger, UsageRecord, UsageSummary};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Result of a quota check.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaCheck {
    pub allowed: bool,
    /// Whether trial ceilings applied to this identity.
    pub trial: bool,
    pub state: QuotaState,
    /// User-facing reason when denied.
    pub reason: Option<String>,
    /// Set when the ledger failed and zero usage was assumed.
    pub collaborator_degraded: bool,
}

impl QuotaCheck {
    pub fn messages_remaining(&self) -> Option<u64> {
        self.state.messages_remaining
    }

    pub fn tokens_remaining(&self) -> Option<u64> {
        self.state.tokens_remaining
    }
}

/// Outcome of validating a requested model against the trial allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelValidation {
    pub allowed: bool,
    /// The model to use: the requested one, or its substitute.
    pub model_id: String,
    pub model_adjusted: bool,
    pub reason: Option<String>,
}

/// Snapshot of the quota rules, rebuilt on reload.
#[derive(Debug)]
struct QuotaPolicy {
    config: QuotaConfig,
    paid_plans: HashSet<String>,
    plan_defaults: HashMap<String, String>,
    trial_models: HashSet<String>,
}

impl QuotaPolicy {
    fn new(config: &QuotaConfig, tiers: &TiersConfig) -> Self {
        let paid_plans = tiers
            .plans
            .iter()
            .filter(|(_, plan)| plan.paid)
            .map(|(code, _)| code.to_lowercase())
            .collect();
        let plan_defaults = tiers
            .plans
            .iter()
            .filter_map(|(code, plan)| {
                plan.default_model
                    .as_ref()
                    .map(|model| (code.to_lowercase(), model.clone()))
            })
            .collect();
        let trial_models = config
            .trial_models
            .iter()
            .map(|id| normalize_model_id(id))
            .collect();
        Self {
            config: config.clone(),
            paid_plans,
            plan_defaults,
            trial_models,
        }
    }

    fn is_paid(&self, plan_code: &str) -> bool {
        self.paid_plans.contains(&plan_code.to_lowercase())
    }

    fn fallback_model(&self, plan_code: &str) -> &str {
        self.plan_defaults
            .get(&plan_code.to_lowercase())
            .filter(|model| self.trial_models.contains(&normalize_model_id(model)))
            .map(String::as_str)
            .unwrap_or(&self.config.fallback_model)
    }

    fn state_for(&self, usage: UsageSummary) -> QuotaState {
        QuotaState::limited(usage, self.config.max_messages, self.config.max_tokens)
    }

    fn denial_reason(&self, state: &QuotaState) -> Option<String> {
        let locale = self.config.locale;
        if state.messages_remaining == Some(0) {
            Some(messages_exhausted(locale).to_string())
        } else if state.tokens_remaining == Some(0) {
            Some(tokens_exhausted(locale).to_string())
        } else {
            None
        }
    }

    fn since(&self) -> Option<chrono::DateTime<Utc>> {
        self.config
            .reset_period_days
            .map(|days| Utc::now() - chrono::Duration::days(i64::from(days)))
    }

    fn memo_ttl(&self) -> Option<Duration> {
        (self.config.memo_ttl_ms > 0).then(|| Duration::from_millis(self.config.memo_ttl_ms))
    }
}

/// Lowercased id with any `:free` variant suffix removed.
fn normalize_model_id(id: &str) -> String {
    let lower = id.trim().to_lowercase();
    match lower.strip_suffix(":free") {
        Some(base) => base.to_string(),
        None => lower,
    }
}

fn messages_exhausted(locale: QuotaLocale) -> &'static str {
    match locale {
        QuotaLocale::Vi => "Bạn đã sử dụng hết số tin nhắn miễn phí. Nâng cấp để tiếp tục chat.",
        QuotaLocale::En => "You have used all free messages. Upgrade to keep chatting.",
    }
}

fn tokens_exhausted(locale: QuotaLocale) -> &'static str {
    match locale {
        QuotaLocale::Vi => "Bạn đã sử dụng hết quota miễn phí. Nâng cấp để tiếp tục chat.",
        QuotaLocale::En => "You have used your free quota. Upgrade to keep chatting.",
    }
}

fn model_substituted(locale: QuotaLocale, requested: &str, fallback: &str) -> String {
    match locale {
        QuotaLocale::Vi => {
            format!("Model {requested} không khả dụng cho bản dùng thử. Đang sử dụng {fallback}.")
        }
        QuotaLocale::En => {
            format!("Model {requested} is not available on the trial. Using {fallback}.")
        }
    }
}

/// Trial quota tracker over a usage ledger.
pub struct QuotaTracker {
    policy: ArcSwap<QuotaPolicy>,
    ledger: Arc<dyn UsageLedger>,
    memo: DashMap<String, (Instant, QuotaState)>,
}

impl QuotaTracker {
    pub fn new(config: &QuotaConfig, tiers: &TiersConfig, ledger: Arc<dyn UsageLedger>) -> Self {
        Self {
            policy: ArcSwap::from_pointee(QuotaPolicy::new(config, tiers)),
            ledger,
            memo: DashMap::new(),
        }
    }

    /// Replace the quota rules. Memoized states are dropped.
    pub fn reload(&self, config: &QuotaConfig, tiers: &TiersConfig) {
        self.policy.store(Arc::new(QuotaPolicy::new(config, tiers)));
        self.memo.clear();
        info!(
            max_messages = config.max_messages,
            max_tokens = config.max_tokens,
            "quota rules reloaded"
        );
    }

    pub fn ledger(&self) -> &Arc<dyn UsageLedger> {
        &self.ledger
    }

    pub fn is_paid(&self, plan_code: &str) -> bool {
        self.policy.load().is_paid(plan_code)
    }

    /// Read-only quota check. Never mutates the ledger.
    pub async fn check_quota(&self, identity: &str, plan_code: &str) -> QuotaCheck {
        let policy = self.policy.load_full();
        if policy.is_paid(plan_code) {
            return QuotaCheck {
                allowed: true,
                trial: false,
                state: QuotaState::unlimited(UsageSummary::default()),
                reason: None,
                collaborator_degraded: false,
            };
        }

        let ttl = policy.memo_ttl();
        if let Some(state) = ttl.and_then(|ttl| self.memoized(identity, ttl)) {
            return trial_check(&policy, state, false);
        }

        match self.ledger.sum_usage(identity, policy.since()).await {
            Ok(usage) => {
                let state = policy.state_for(usage);
                if ttl.is_some() {
                    self.remember(identity, state);
                }
                let check = trial_check(&policy, state, false);
                if !check.allowed {
                    debug!(
                        identity,
                        messages_used = state.messages_used,
                        tokens_used = state.tokens_used,
                        "trial quota exhausted"
                    );
                }
                check
            }
            Err(e) => {
                warn!(
                    identity,
                    error = %e,
                    "usage ledger unavailable, assuming zero usage"
                );
                trial_check(&policy, policy.state_for(UsageSummary::default()), true)
            }
        }
    }

    /// Quota check that turns a denial into `GateError::QuotaExhausted`.
    pub async fn check_access(
        &self,
        identity: &str,
        plan_code: &str,
    ) -> Result<QuotaCheck, GateError> {
        let check = self.check_quota(identity, plan_code).await;
        if check.allowed {
            Ok(check)
        } else {
            Err(GateError::QuotaExhausted {
                reason: check.reason.unwrap_or_default(),
            })
        }
    }

    /// Append a usage record and return the state after accounting for it.
    pub async fn record_usage(
        &self,
        identity: &str,
        plan_code: &str,
        record: UsageRecord,
    ) -> Result<QuotaState, GateError> {
        self.ledger.append(identity, record).await?;

        let policy = self.policy.load_full();
        let usage = match self.ledger.sum_usage(identity, policy.since()).await {
            Ok(usage) => usage,
            Err(e) => {
                self.memo.remove(identity);
                return Err(e);
            }
        };
        if policy.is_paid(plan_code) {
            return Ok(QuotaState::unlimited(usage));
        }

        let state = policy.state_for(usage);
        if policy.memo_ttl().is_some() {
            self.remember(identity, state);
        } else {
            self.memo.remove(identity);
        }
        Ok(state)
    }

    /// Check a requested model against the trial allow-list, substituting
    /// the plan's fallback when it is not allowed.
    pub fn validate_model_for_trial(&self, model_id: &str, plan_code: &str) -> ModelValidation {
        let policy = self.policy.load();
        if policy.is_paid(plan_code) || policy.trial_models.contains(&normalize_model_id(model_id))
        {
            return ModelValidation {
                allowed: true,
                model_id: model_id.to_string(),
                model_adjusted: false,
                reason: None,
            };
        }

        let fallback = policy.fallback_model(plan_code);
        debug!(
            requested = model_id,
            fallback, plan = plan_code, "trial model substituted"
        );
        ModelValidation {
            allowed: false,
            model_id: fallback.to_string(),
            model_adjusted: true,
            reason: Some(model_substituted(policy.config.locale, model_id, fallback)),
        }
    }

    /// Models a trial identity may use, as configured.
    pub fn allowed_trial_models(&self) -> Vec<String> {
        self.policy.load().config.trial_models.clone()
    }

    /// Number of memoized identities.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Memoize `state` unless a fresher one is already held.
    ///
    /// Usage only grows, so a state with lower counters was summed before a
    /// later append and must not replace the post-accounting state.
    fn remember(&self, identity: &str, state: QuotaState) {
        let now = Instant::now();
        self.memo
            .entry(identity.to_string())
            .and_modify(|(stored_at, held)| {
                let stale = state.messages_used < held.messages_used
                    || state.tokens_used < held.tokens_used;
                if !stale {
                    *stored_at = now;
                    *held = state;
                }
            })
            .or_insert((now, state));
    }

    fn memoized(&self, identity: &str, ttl: Duration) -> Option<QuotaState> {
        let entry = self.memo.get(identity)?;
        let (stored_at, state) = *entry;
        drop(entry);
        if stored_at.elapsed() < ttl {
            Some(state)
        } else {
            self.memo.remove(identity);
            None
        }
    }
}

fn trial_check(policy: &QuotaPolicy, state: QuotaState, degraded: bool) -> QuotaCheck {
    let reason = policy.denial_reason(&state);
    QuotaCheck {
        allowed: reason.is_none(),
        trial: true,
        state,
        reason,
        collaborator_degraded: degraded,
    }
}
