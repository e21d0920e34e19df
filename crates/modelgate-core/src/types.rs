// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common value types shared by the classifier, selector, limiter, and quota tracker.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Health status reported by collaborator health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Collaborator is fully operational.
    Healthy,
    /// Collaborator is operational but experiencing issues.
    Degraded(String),
    /// Collaborator is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external collaborator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Entitlement,
    UsageLedger,
}

/// Task category derived from prompt keywords.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Coding,
    Math,
    Medical,
    Analysis,
    Creative,
    Translation,
    General,
}

impl Category {
    /// Keyword-scored categories in tie-break order. `General` is the zero-score default.
    pub const SCORED: [Category; 6] = [
        Category::Coding,
        Category::Math,
        Category::Medical,
        Category::Analysis,
        Category::Creative,
        Category::Translation,
    ];

    /// Human-readable label used in routing reasons.
    pub fn label(self) -> &'static str {
        match self {
            Category::Coding => "coding",
            Category::Math => "math",
            Category::Medical => "medical questions",
            Category::Analysis => "analysis",
            Category::Creative => "creative writing",
            Category::Translation => "translation",
            Category::General => "general chat",
        }
    }
}

/// Estimated prompt complexity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    /// Tier a request of this complexity ideally runs on.
    pub fn ideal_tier(self) -> Tier {
        match self {
            Complexity::Simple => Tier::Budget,
            Complexity::Medium => Tier::Standard,
            Complexity::Complex => Tier::Premium,
        }
    }

    /// Score multiplier applied by weighted selection.
    pub fn score_multiplier(self) -> f64 {
        match self {
            Complexity::Simple => 0.8,
            Complexity::Medium => 1.0,
            Complexity::Complex => 1.2,
        }
    }

    /// Output tokens expected per input token.
    pub fn output_multiplier(self) -> f64 {
        match self {
            Complexity::Simple => 1.5,
            Complexity::Medium => 2.5,
            Complexity::Complex => 4.0,
        }
    }

    /// Human-readable label used in routing reasons.
    pub fn label(self) -> &'static str {
        match self {
            Complexity::Simple => "quick reply",
            Complexity::Medium => "moderate depth",
            Complexity::Complex => "in-depth",
        }
    }
}

/// Detected prompt language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// The default language (no secondary-language diacritics seen).
    Primary,
    /// Text containing secondary-language diacritics.
    Secondary,
}

/// Result of classifying a single request. Produced once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub complexity: Complexity,
    pub language: Language,
    pub has_attachments: bool,
}

/// Capability tier. Tier 1 is the cheapest and fastest class, tier 3 the most capable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    Budget,
    Standard,
    Premium,
}

impl Tier {
    /// Numeric level (1..=3).
    pub fn level(self) -> u8 {
        match self {
            Tier::Budget => 1,
            Tier::Standard => 2,
            Tier::Premium => 3,
        }
    }

    /// Parse a numeric level.
    pub fn from_level(level: u8) -> Option<Tier> {
        match level {
            1 => Some(Tier::Budget),
            2 => Some(Tier::Standard),
            3 => Some(Tier::Premium),
            _ => None,
        }
    }

    /// The next tier down, if any.
    pub fn lower(self) -> Option<Tier> {
        Tier::from_level(self.level() - 1)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier{}", self.level())
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Tier::from_level(value).ok_or_else(|| format!("tier must be 1, 2 or 3, got {value}"))
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.level()
    }
}

/// Ordered set of tiers an identity is entitled to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierSet(BTreeSet<Tier>);

impl TierSet {
    /// The free-plan set: tier 1 only.
    pub fn lowest() -> Self {
        Self::from_iter([Tier::Budget])
    }

    pub fn contains(&self, tier: Tier) -> bool {
        self.0.contains(&tier)
    }

    /// Highest entitled tier.
    pub fn max(&self) -> Option<Tier> {
        self.0.last().copied()
    }

    pub fn is_superset(&self, other: &TierSet) -> bool {
        self.0.is_superset(&other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Tiers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Tier> + '_ {
        self.0.iter().copied()
    }

    pub fn levels(&self) -> Vec<u8> {
        self.iter().map(Tier::level).collect()
    }
}

impl FromIterator<Tier> for TierSet {
    fn from_iter<I: IntoIterator<Item = Tier>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Per-dimension capability scores, each 0 to 10.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapabilityVector {
    pub reasoning: f64,
    pub creativity: f64,
    pub coding: f64,
    pub analysis: f64,
    pub speed: f64,
    pub cost_efficiency: f64,
}

impl CapabilityVector {
    /// All dimensions paired with their names, for validation.
    pub fn dimensions(&self) -> [(&'static str, f64); 6] {
        [
            ("reasoning", self.reasoning),
            ("creativity", self.creativity),
            ("coding", self.coding),
            ("analysis", self.analysis),
            ("speed", self.speed),
            ("cost_efficiency", self.cost_efficiency),
        ]
    }
}

/// A routable backend model. Catalog entries are read-only at request time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescriptor {
    pub id: String,
    pub provider_id: String,
    pub tier: Tier,
    pub capabilities: CapabilityVector,
    /// USD per 1,000 input tokens.
    pub cost_per_input_unit: f64,
    /// USD per 1,000 output tokens.
    pub cost_per_output_unit: f64,
    pub context_window: u32,
}

/// Bounded ring buffer of recent prompts. Oldest entries are evicted first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHistory {
    capacity: usize,
    entries: VecDeque<String>,
}

impl QueryHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, query: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(query.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Per-request view of the caller, built from the entitlement source.
#[derive(Debug, Clone, PartialEq)]
pub struct UserContext {
    pub identity_id: String,
    pub plan_code: String,
    /// Remaining monetary budget in USD.
    pub remaining_budget: f64,
    pub preferred_model_ids: Vec<String>,
    pub recent_queries: QueryHistory,
}

impl UserContext {
    pub fn new(
        identity_id: impl Into<String>,
        plan_code: impl Into<String>,
        remaining_budget: f64,
        preferred_model_ids: Vec<String>,
        recent_queries: QueryHistory,
    ) -> Self {
        Self {
            identity_id: identity_id.into(),
            plan_code: plan_code.into(),
            remaining_budget,
            preferred_model_ids,
            recent_queries,
        }
    }

    pub fn prefers(&self, model_id: &str) -> bool {
        self.preferred_model_ids.iter().any(|m| m == model_id)
    }
}

/// Why a decision left the normal selection path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    None,
    /// No candidate fit the budget; the cheapest one was chosen.
    BudgetConstraint,
    /// No tier matched; the first available model was chosen.
    DefaultModel,
    /// Nothing was available; the hardcoded minimal default was returned.
    NoModelAvailable,
}

/// Which selector produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Affinity,
    Weighted,
}

/// Output of model selection. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub selected_model_id: String,
    pub provider_id: String,
    pub reason: String,
    /// 0.0 to 1.0.
    pub confidence: f64,
    pub alternative_model_ids: Vec<String>,
    /// Absent for strategies that do not price candidates.
    pub estimated_cost: Option<f64>,
    pub estimated_tokens: Option<u32>,
    pub tier: Tier,
    pub strategy: StrategyKind,
    pub fallback: FallbackKind,
}

/// Plan and budget returned by the entitlement source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub plan_code: String,
    /// Remaining monetary budget in USD.
    pub remaining_budget: f64,
    #[serde(default)]
    pub preferred_model_ids: Vec<String>,
}

impl PlanSnapshot {
    /// Degraded-trust snapshot used when the entitlement source fails.
    pub fn degraded() -> Self {
        Self {
            plan_code: "free".to_string(),
            remaining_budget: 0.0,
            preferred_model_ids: Vec::new(),
        }
    }
}

/// Aggregated ledger usage for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageSummary {
    pub message_count: u64,
    pub total_tokens: u64,
}

/// A single ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub model_id: String,
    pub tokens: u64,
    pub cost_usd: f64,
    pub created_at: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(model_id: impl Into<String>, tokens: u64, cost_usd: f64) -> Self {
        Self {
            model_id: model_id.into(),
            tokens,
            cost_usd,
            created_at: Utc::now(),
        }
    }
}

/// Quota view derived from the usage ledger. `None` remaining means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    pub messages_used: u64,
    pub tokens_used: u64,
    pub messages_remaining: Option<u64>,
    pub tokens_remaining: Option<u64>,
}

impl QuotaState {
    pub fn unlimited(usage: UsageSummary) -> Self {
        Self {
            messages_used: usage.message_count,
            tokens_used: usage.total_tokens,
            messages_remaining: None,
            tokens_remaining: None,
        }
    }

    /// Remaining counts against hard ceilings, clamped at zero.
    pub fn limited(usage: UsageSummary, max_messages: u64, max_tokens: u64) -> Self {
        Self {
            messages_used: usage.message_count,
            tokens_used: usage.total_tokens,
            messages_remaining: Some(max_messages.saturating_sub(usage.message_count)),
            tokens_remaining: Some(max_tokens.saturating_sub(usage.total_tokens)),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.messages_remaining.is_none() && self.tokens_remaining.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn category_round_trips_lowercase() {
        for category in Category::iter() {
            let s = category.to_string();
            assert_eq!(s, s.to_lowercase());
            assert_eq!(Category::from_str(&s).unwrap(), category);
        }
        assert_eq!(Category::from_str("CODING").unwrap(), Category::Coding);
    }

    #[test]
    fn scored_categories_exclude_general() {
        assert!(!Category::SCORED.contains(&Category::General));
        assert_eq!(Category::SCORED[0], Category::Coding);
    }

    #[test]
    fn tier_serde_uses_levels() {
        let json = serde_json::to_string(&Tier::Standard).unwrap();
        assert_eq!(json, "2");
        let parsed: Tier = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Tier::Premium);
        assert!(serde_json::from_str::<Tier>("4").is_err());
    }

    #[test]
    fn tier_lower_walks_down() {
        assert_eq!(Tier::Premium.lower(), Some(Tier::Standard));
        assert_eq!(Tier::Standard.lower(), Some(Tier::Budget));
        assert_eq!(Tier::Budget.lower(), None);
    }

    #[test]
    fn tier_set_ordering_and_superset() {
        let low = TierSet::lowest();
        let all: TierSet = Tier::iter().collect();
        assert_eq!(all.levels(), vec![1, 2, 3]);
        assert_eq!(all.max(), Some(Tier::Premium));
        assert!(all.is_superset(&low));
        assert!(!low.is_superset(&all));
    }

    #[test]
    fn complexity_ideal_tiers() {
        assert_eq!(Complexity::Simple.ideal_tier(), Tier::Budget);
        assert_eq!(Complexity::Medium.ideal_tier(), Tier::Standard);
        assert_eq!(Complexity::Complex.ideal_tier(), Tier::Premium);
    }

    #[test]
    fn query_history_evicts_oldest() {
        let mut history = QueryHistory::with_capacity(2);
        history.push("a");
        history.push("b");
        history.push("c");
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn zero_capacity_history_stays_empty() {
        let mut history = QueryHistory::with_capacity(0);
        history.push("a");
        assert!(history.is_empty());
    }

    #[test]
    fn quota_state_clamps_at_zero() {
        let usage = UsageSummary {
            message_count: 12,
            total_tokens: 10,
        };
        let state = QuotaState::limited(usage, 10, 50_000);
        assert_eq!(state.messages_remaining, Some(0));
        assert_eq!(state.tokens_remaining, Some(49_990));
        assert!(!state.is_unlimited());
        assert!(QuotaState::unlimited(usage).is_unlimited());
    }

    #[test]
    fn fallback_kind_display() {
        assert_eq!(FallbackKind::BudgetConstraint.to_string(), "budget_constraint");
        assert_eq!(FallbackKind::NoModelAvailable.to_string(), "no_model_available");
    }
}
