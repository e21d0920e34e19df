// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the modelgate request router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use modelgate_core::{Category, ModelDescriptor, StrategyKind, Tier};
use serde::{Deserialize, Serialize};

use crate::defaults;

/// Top-level modelgate configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to the built-in routing tables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelgateConfig {
    /// Process identity and logging settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Strategy selection and fallback model settings.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Keyword tables and length thresholds for prompt classification.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Plan-to-tier table and model tier lists.
    #[serde(default)]
    pub tiers: TiersConfig,

    /// Per-category preferred model lists, by tier.
    #[serde(default)]
    pub affinity: AffinityConfig,

    /// Static model catalog used by weighted selection.
    #[serde(default = "defaults::catalog")]
    pub catalog: Vec<ModelDescriptor>,

    /// Sliding-window rate limiter profiles.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Trial quota settings.
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Usage ledger backend settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Prometheus metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for ModelgateConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            routing: RoutingConfig::default(),
            classifier: ClassifierConfig::default(),
            tiers: TiersConfig::default(),
            affinity: AffinityConfig::default(),
            catalog: defaults::catalog(),
            rate_limit: RateLimitConfig::default(),
            quota: QuotaConfig::default(),
            ledger: LedgerConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Instance name reported in logs.
    #[serde(default = "default_gateway_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Capacity of each identity's recent-query ring buffer.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Seconds without a request after which an identity's history is dropped.
    #[serde(default = "default_history_idle_secs")]
    pub history_idle_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            name: default_gateway_name(),
            log_level: default_log_level(),
            history_capacity: default_history_capacity(),
            history_idle_secs: default_history_idle_secs(),
        }
    }
}

fn default_gateway_name() -> String {
    "modelgate".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_capacity() -> usize {
    8
}

fn default_history_idle_secs() -> u64 {
    3600
}

/// Strategy selection and fallback model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Which selector the gateway uses. Weighted selection prices candidates
    /// against the budget and is used for billing-relevant decisions.
    #[serde(default = "default_strategy")]
    pub strategy: StrategyKind,

    /// Force all requests to a specific model, bypassing selection.
    #[serde(default)]
    pub force_model: Option<String>,

    /// Model returned when no candidate is available at all.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Provider of `fallback_model`.
    #[serde(default = "default_fallback_provider")]
    pub fallback_provider: String,

    /// Honour a leading `/model <id>` prefix in request text.
    #[serde(default = "default_allow_model_override")]
    pub allow_model_override: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            force_model: None,
            fallback_model: default_fallback_model(),
            fallback_provider: default_fallback_provider(),
            allow_model_override: default_allow_model_override(),
        }
    }
}

fn default_strategy() -> StrategyKind {
    StrategyKind::Weighted
}

fn default_fallback_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_fallback_provider() -> String {
    "google".to_string()
}

fn default_allow_model_override() -> bool {
    true
}

/// Keyword tables and thresholds for the prompt classifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Any of these phrases escalates complexity to `complex`.
    #[serde(default = "defaults::complex_keywords")]
    pub complex_keywords: Vec<String>,

    /// Any of these phrases escalates complexity to `medium`.
    #[serde(default = "defaults::medium_keywords")]
    pub medium_keywords: Vec<String>,

    /// Characters marking the secondary language.
    #[serde(default = "defaults::secondary_diacritics")]
    pub secondary_diacritics: String,

    /// Prompts shorter than this with no keyword match stay `simple`.
    #[serde(default = "default_short_prompt_chars")]
    pub short_prompt_chars: usize,

    /// Prompts longer than this are at least `medium`.
    #[serde(default = "default_medium_length_chars")]
    pub medium_length_chars: usize,

    /// Prompts longer than this are `complex`.
    #[serde(default = "default_complex_length_chars")]
    pub complex_length_chars: usize,

    /// Category keyword lists.
    #[serde(default)]
    pub categories: CategoryKeywords,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            complex_keywords: defaults::complex_keywords(),
            medium_keywords: defaults::medium_keywords(),
            secondary_diacritics: defaults::secondary_diacritics(),
            short_prompt_chars: default_short_prompt_chars(),
            medium_length_chars: default_medium_length_chars(),
            complex_length_chars: default_complex_length_chars(),
            categories: CategoryKeywords::default(),
        }
    }
}

fn default_short_prompt_chars() -> usize {
    20
}

fn default_medium_length_chars() -> usize {
    150
}

fn default_complex_length_chars() -> usize {
    500
}

/// Keyword list per scored category.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryKeywords {
    #[serde(default = "defaults::coding_keywords")]
    pub coding: Vec<String>,
    #[serde(default = "defaults::math_keywords")]
    pub math: Vec<String>,
    #[serde(default = "defaults::medical_keywords")]
    pub medical: Vec<String>,
    #[serde(default = "defaults::analysis_keywords")]
    pub analysis: Vec<String>,
    #[serde(default = "defaults::creative_keywords")]
    pub creative: Vec<String>,
    #[serde(default = "defaults::translation_keywords")]
    pub translation: Vec<String>,
}

impl Default for CategoryKeywords {
    fn default() -> Self {
        Self {
            coding: defaults::coding_keywords(),
            math: defaults::math_keywords(),
            medical: defaults::medical_keywords(),
            analysis: defaults::analysis_keywords(),
            creative: defaults::creative_keywords(),
            translation: defaults::translation_keywords(),
        }
    }
}

impl CategoryKeywords {
    /// Keywords for a scored category. `General` has none.
    pub fn for_category(&self, category: Category) -> &[String] {
        match category {
            Category::Coding => &self.coding,
            Category::Math => &self.math,
            Category::Medical => &self.medical,
            Category::Analysis => &self.analysis,
            Category::Creative => &self.creative,
            Category::Translation => &self.translation,
            Category::General => &[],
        }
    }
}

/// Plan table and model tier lists.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TiersConfig {
    /// Plan code to entitlement. Codes are matched case-insensitively.
    #[serde(default = "defaults::plans")]
    pub plans: BTreeMap<String, PlanConfig>,

    /// Model ids per capability tier, used to resolve an id's tier.
    #[serde(default)]
    pub models: ModelTierLists,

    /// Tier assumed for ids that match no list.
    #[serde(default = "default_unknown_model_tier")]
    pub unknown_model_tier: Tier,
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            plans: defaults::plans(),
            models: ModelTierLists::default(),
            unknown_model_tier: default_unknown_model_tier(),
        }
    }
}

fn default_unknown_model_tier() -> Tier {
    Tier::Standard
}

/// Entitlement attached to a plan code.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    /// Capability tiers the plan may use.
    pub tiers: Vec<Tier>,

    /// Paid plans bypass trial quotas and model restrictions.
    #[serde(default)]
    pub paid: bool,

    /// Model substituted when a trial request names a disallowed model.
    #[serde(default)]
    pub default_model: Option<String>,
}

/// Model id lists per tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelTierLists {
    #[serde(default = "defaults::tier1_models")]
    pub tier1: Vec<String>,
    #[serde(default = "defaults::tier2_models")]
    pub tier2: Vec<String>,
    #[serde(default = "defaults::tier3_models")]
    pub tier3: Vec<String>,
}

impl Default for ModelTierLists {
    fn default() -> Self {
        Self {
            tier1: defaults::tier1_models(),
            tier2: defaults::tier2_models(),
            tier3: defaults::tier3_models(),
        }
    }
}

impl ModelTierLists {
    pub fn for_tier(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Budget => &self.tier1,
            Tier::Standard => &self.tier2,
            Tier::Premium => &self.tier3,
        }
    }
}

/// Preferred model ids for one category, ordered by intent within each tier.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AffinityTiers {
    #[serde(default)]
    pub tier1: Vec<String>,
    #[serde(default)]
    pub tier2: Vec<String>,
    #[serde(default)]
    pub tier3: Vec<String>,
}

impl AffinityTiers {
    pub fn for_tier(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Budget => &self.tier1,
            Tier::Standard => &self.tier2,
            Tier::Premium => &self.tier3,
        }
    }
}

/// Affinity tables for every category.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AffinityConfig {
    #[serde(default = "defaults::coding_affinity")]
    pub coding: AffinityTiers,
    #[serde(default = "defaults::math_affinity")]
    pub math: AffinityTiers,
    #[serde(default = "defaults::medical_affinity")]
    pub medical: AffinityTiers,
    #[serde(default = "defaults::analysis_affinity")]
    pub analysis: AffinityTiers,
    #[serde(default = "defaults::creative_affinity")]
    pub creative: AffinityTiers,
    #[serde(default = "defaults::translation_affinity")]
    pub translation: AffinityTiers,
    #[serde(default = "defaults::general_affinity")]
    pub general: AffinityTiers,
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self {
            coding: defaults::coding_affinity(),
            math: defaults::math_affinity(),
            medical: defaults::medical_affinity(),
            analysis: defaults::analysis_affinity(),
            creative: defaults::creative_affinity(),
            translation: defaults::translation_affinity(),
            general: defaults::general_affinity(),
        }
    }
}

impl AffinityConfig {
    pub fn for_category(&self, category: Category) -> &AffinityTiers {
        match category {
            Category::Coding => &self.coding,
            Category::Math => &self.math,
            Category::Medical => &self.medical,
            Category::Analysis => &self.analysis,
            Category::Creative => &self.creative,
            Category::Translation => &self.translation,
            Category::General => &self.general,
        }
    }
}

/// One request ceiling and window pair per key kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitProfile {
    /// Requests allowed per address within `address_window_secs`.
    pub address_limit: u32,
    pub address_window_secs: u64,
    /// Requests allowed per identity within `identity_window_secs`.
    pub identity_limit: u32,
    pub identity_window_secs: u64,
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Interval between expired-entry sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Profile used for chat requests.
    #[serde(default = "default_chat_profile")]
    pub chat: RateLimitProfile,

    /// Profile for general API endpoints.
    #[serde(default = "default_api_profile")]
    pub api: RateLimitProfile,

    /// Profile for payment endpoints.
    #[serde(default = "default_payment_profile")]
    pub payment: RateLimitProfile,

    /// Hourly profile for newsletter signups.
    #[serde(default = "default_newsletter_profile")]
    pub newsletter: RateLimitProfile,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            chat: default_chat_profile(),
            api: default_api_profile(),
            payment: default_payment_profile(),
            newsletter: default_newsletter_profile(),
        }
    }
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_chat_profile() -> RateLimitProfile {
    RateLimitProfile {
        address_limit: 30,
        address_window_secs: 60,
        identity_limit: 10,
        identity_window_secs: 60,
    }
}

fn default_api_profile() -> RateLimitProfile {
    RateLimitProfile {
        address_limit: 20,
        address_window_secs: 60,
        identity_limit: 10,
        identity_window_secs: 60,
    }
}

fn default_payment_profile() -> RateLimitProfile {
    RateLimitProfile {
        address_limit: 30,
        address_window_secs: 60,
        identity_limit: 10,
        identity_window_secs: 60,
    }
}

fn default_newsletter_profile() -> RateLimitProfile {
    RateLimitProfile {
        address_limit: 5,
        address_window_secs: 3600,
        identity_limit: 3,
        identity_window_secs: 3600,
    }
}

/// Language for user-facing quota messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaLocale {
    Vi,
    En,
}

/// Trial quota configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    /// Messages a trial identity may send.
    #[serde(default = "default_max_messages")]
    pub max_messages: u64,

    /// Cumulative tokens a trial identity may consume.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,

    /// Replenish trial usage every N days. `None` means the trial never replenishes.
    #[serde(default)]
    pub reset_period_days: Option<u32>,

    /// Memoize per-identity quota reads for this many milliseconds. 0 disables.
    #[serde(default)]
    pub memo_ttl_ms: u64,

    /// Language of user-facing denial reasons.
    #[serde(default = "default_locale")]
    pub locale: QuotaLocale,

    /// Models trial identities may use.
    #[serde(default = "defaults::tier1_models")]
    pub trial_models: Vec<String>,

    /// Substitute for disallowed trial models.
    #[serde(default = "default_trial_fallback_model")]
    pub fallback_model: String,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_tokens: default_max_tokens(),
            reset_period_days: None,
            memo_ttl_ms: 0,
            locale: default_locale(),
            trial_models: defaults::tier1_models(),
            fallback_model: default_trial_fallback_model(),
        }
    }
}

fn default_max_messages() -> u64 {
    10
}

fn default_max_tokens() -> u64 {
    50_000
}

fn default_locale() -> QuotaLocale {
    QuotaLocale::Vi
}

fn default_trial_fallback_model() -> String {
    "gemini-2.0-flash".to_string()
}

/// Usage ledger backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    Memory,
    Sqlite,
}

/// Usage ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_backend")]
    pub backend: LedgerBackend,

    /// Path to the SQLite database file when `backend = "sqlite"`.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: default_ledger_backend(),
            database_path: default_database_path(),
        }
    }
}

fn default_ledger_backend() -> LedgerBackend {
    LedgerBackend::Memory
}

fn default_database_path() -> String {
    "modelgate.db".to_string()
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder at startup.
    #[serde(default)]
    pub enabled: bool,
}
