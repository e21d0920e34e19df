// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Affinity-table walk: deterministic, low-latency selection.
//!
//! Starting at the tier implied by complexity and walking down to tier 1,
//! the first available preferred model for the category wins; failing that,
//! any available model of the current tier. Table entries match available
//! ids with or without a `provider/` prefix. No cost is estimated, so the
//! available set must already be entitlement-filtered.

use modelgate_config::model::AffinityConfig;
use modelgate_core::{Classification, FallbackKind, RoutingDecision, StrategyKind, Tier};
use tracing::debug;

use crate::catalog::{AvailableModel, same_model};
use crate::reason::{build_reason, display_name};
use crate::strategy::{FallbackModel, SelectionInput, SelectionStrategy};
use crate::tiers::ModelTierIndex;

const PREFERRED_CONFIDENCE: f64 = 0.9;
const TIER_MATCH_CONFIDENCE: f64 = 0.75;
const DEFAULT_MODEL_CONFIDENCE: f64 = 0.5;
const MAX_ALTERNATIVES: usize = 3;

#[derive(Debug, Clone)]
pub struct AffinitySelector {
    table: AffinityConfig,
    tier_index: ModelTierIndex,
    fallback: FallbackModel,
}

impl AffinitySelector {
    pub fn new(table: AffinityConfig, tier_index: ModelTierIndex, fallback: FallbackModel) -> Self {
        Self {
            table,
            tier_index,
            fallback,
        }
    }

    /// Pick a model for `classification` from `available`.
    pub fn select_from(
        &self,
        classification: &Classification,
        available: &[AvailableModel],
    ) -> RoutingDecision {
        let preferred = self.table.for_category(classification.category);
        let mut tier = Some(classification.complexity.ideal_tier());

        while let Some(current) = tier {
            let ids = preferred.for_tier(current);

            let hit = ids
                .iter()
                .find_map(|id| available.iter().find(|m| same_model(&m.id, id)))
                .map(|m| (m, PREFERRED_CONFIDENCE))
                .or_else(|| {
                    available
                        .iter()
                        .find(|m| self.tier_index.resolve(&m.id) == current)
                        .map(|m| (m, TIER_MATCH_CONFIDENCE))
                });

            if let Some((model, confidence)) = hit {
                debug!(
                    model = %model.id,
                    tier = %current,
                    category = %classification.category,
                    "affinity selection"
                );
                return RoutingDecision {
                    selected_model_id: model.id.clone(),
                    provider_id: model.provider_id.clone(),
                    reason: build_reason(&model.id, classification),
                    confidence,
                    alternative_model_ids: self.alternatives(ids, current, &model.id, available),
                    estimated_cost: None,
                    estimated_tokens: None,
                    tier: current,
                    strategy: StrategyKind::Affinity,
                    fallback: FallbackKind::None,
                };
            }

            tier = current.lower();
        }

        match available.first() {
            Some(model) => RoutingDecision {
                selected_model_id: model.id.clone(),
                provider_id: model.provider_id.clone(),
                reason: format!("using default model {}", display_name(&model.id)),
                confidence: DEFAULT_MODEL_CONFIDENCE,
                alternative_model_ids: Vec::new(),
                estimated_cost: None,
                estimated_tokens: None,
                tier: self.tier_index.resolve(&model.id),
                strategy: StrategyKind::Affinity,
                fallback: FallbackKind::DefaultModel,
            },
            None => self.fallback.no_model_available(StrategyKind::Affinity),
        }
    }

    /// Other candidates of the same tier: preferred ones first, then tier matches.
    fn alternatives(
        &self,
        preferred: &[String],
        tier: Tier,
        chosen: &str,
        available: &[AvailableModel],
    ) -> Vec<String> {
        let preferred_hits = preferred
            .iter()
            .filter_map(|id| available.iter().find(|m| same_model(&m.id, id)))
            .map(|m| m.id.clone());
        let tier_hits = available
            .iter()
            .filter(|m| self.tier_index.resolve(&m.id) == tier)
            .map(|m| m.id.clone());

        let mut out: Vec<String> = Vec::with_capacity(MAX_ALTERNATIVES);
        for id in preferred_hits.chain(tier_hits) {
            if out.len() == MAX_ALTERNATIVES {
                break;
            }
            if id != chosen && !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

impl SelectionStrategy for AffinitySelector {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Affinity
    }

    fn select(&self, input: &SelectionInput<'_>) -> RoutingDecision {
        self.select_from(input.classification, input.available)
    }
}
