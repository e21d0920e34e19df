// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plan-to-tier resolution and model-to-tier lookup.

use std::collections::HashMap;

use modelgate_config::model::{PlanConfig, TiersConfig};
use modelgate_core::{Tier, TierSet};
use strum::IntoEnumIterator;
use tracing::debug;

/// Static plan table. Stateless apart from the table itself; consult it on
/// every request because entitlement can change between requests.
#[derive(Debug, Clone)]
pub struct TierResolver {
    plans: HashMap<String, PlanConfig>,
}

fn normalize_plan(plan_code: &str) -> String {
    plan_code.trim().to_lowercase()
}

impl TierResolver {
    pub fn from_config(config: &TiersConfig) -> Self {
        Self {
            plans: config
                .plans
                .iter()
                .map(|(code, plan)| (normalize_plan(code), plan.clone()))
                .collect(),
        }
    }

    /// Allowed tiers for `plan_code`. Unknown or empty codes get tier 1 only.
    pub fn resolve_tiers(&self, plan_code: &str) -> TierSet {
        match self.plans.get(&normalize_plan(plan_code)) {
            Some(plan) => plan.tiers.iter().copied().collect(),
            None => {
                debug!(plan_code, "unknown plan code, resolving to lowest tier");
                TierSet::lowest()
            }
        }
    }

    /// Whether the plan bypasses trial quotas. Unknown plans are not paid.
    pub fn is_paid(&self, plan_code: &str) -> bool {
        self.plans
            .get(&normalize_plan(plan_code))
            .is_some_and(|p| p.paid)
    }

    /// Plan-specific substitute for disallowed trial models.
    pub fn default_model(&self, plan_code: &str) -> Option<&str> {
        self.plans
            .get(&normalize_plan(plan_code))
            .and_then(|p| p.default_model.as_deref())
    }

    /// Known plan codes, lowercased.
    pub fn plan_codes(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }
}

impl Default for TierResolver {
    fn default() -> Self {
        Self::from_config(&TiersConfig::default())
    }
}

/// Resolves a model id to its capability tier from configured tier lists.
#[derive(Debug, Clone)]
pub struct ModelTierIndex {
    /// Lowercased ids per tier, lowest tier first.
    lists: Vec<(Tier, Vec<String>)>,
    exact: HashMap<String, Tier>,
    unknown: Tier,
}

impl ModelTierIndex {
    pub fn from_config(config: &TiersConfig) -> Self {
        let lists: Vec<(Tier, Vec<String>)> = Tier::iter()
            .map(|tier| {
                let ids = config
                    .models
                    .for_tier(tier)
                    .iter()
                    .map(|m| m.to_lowercase())
                    .collect();
                (tier, ids)
            })
            .collect();

        let mut exact = HashMap::new();
        for (tier, ids) in &lists {
            for id in ids {
                exact.entry(id.clone()).or_insert(*tier);
            }
        }

        Self {
            lists,
            exact,
            unknown: config.unknown_model_tier,
        }
    }

    /// Tier for `model_id`.
    ///
    /// Matching is case-insensitive and ignores a `:free` suffix. Exact
    /// matches win; otherwise the first list entry that contains, or is
    /// contained in, the id decides. Ids matching nothing get the
    /// configured unknown tier.
    pub fn resolve(&self, model_id: &str) -> Tier {
        let normalized = model_id.trim().to_lowercase();
        let base = normalized.strip_suffix(":free").unwrap_or(&normalized);

        if let Some(tier) = self
            .exact
            .get(normalized.as_str())
            .or_else(|| self.exact.get(base))
        {
            return *tier;
        }

        if !base.is_empty() {
            for (tier, ids) in &self.lists {
                if ids
                    .iter()
                    .any(|m| base.contains(m.as_str()) || m.contains(base))
                {
                    return *tier;
                }
            }
        }

        self.unknown
    }
}

impl Default for ModelTierIndex {
    fn default() -> Self {
        Self::from_config(&TiersConfig::default())
    }
}
