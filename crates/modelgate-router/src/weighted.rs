// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weighted capability scoring over the catalog, with cost estimation and a
//! budget guard.

use modelgate_core::{
    CapabilityVector, Category, Classification, FallbackKind, ModelDescriptor, RoutingDecision,
    StrategyKind, TierSet, UserContext,
};
use tracing::{debug, info};

use crate::catalog::ModelCatalog;
use crate::reason::{build_reason, display_name};
use crate::strategy::{FallbackModel, SelectionInput, SelectionStrategy};

/// Ceiling on estimated output tokens.
pub const MAX_OUTPUT_TOKENS: f64 = 2000.0;
/// Characters per estimated input token.
const CHARS_PER_TOKEN: usize = 4;
/// Share of estimated tokens billed at the input rate; the rest at the output rate.
const INPUT_SHARE: f64 = 0.25;
const OUTPUT_SHARE: f64 = 0.75;

const CATEGORY_WEIGHT: f64 = 0.4;
const BLENDED_WEIGHT: f64 = 0.2;
const COST_EFFICIENCY_WEIGHT: f64 = 0.3;
const SPEED_WEIGHT: f64 = 0.2;
const PREFERENCE_BONUS: f64 = 1.0;
const BUDGET_PENALTY: f64 = 0.8;
/// Fraction of remaining budget above which a candidate is penalized.
const BUDGET_PRESSURE: f64 = 0.5;

const BUDGET_FALLBACK_CONFIDENCE: f64 = 0.6;
const MAX_ALTERNATIVES: usize = 3;

/// Estimated total tokens for a request: input is a quarter of the character
/// count, output scales with complexity and is capped.
pub fn estimate_tokens(text: &str, classification: &Classification) -> u32 {
    let input = text.chars().count().div_ceil(CHARS_PER_TOKEN) as f64;
    let output = (input * classification.complexity.output_multiplier())
        .min(MAX_OUTPUT_TOKENS)
        .ceil();
    (input + output) as u32
}

/// Estimated USD cost of `tokens` on `model`. Costs are per 1K tokens.
pub fn estimate_cost(model: &ModelDescriptor, tokens: u32) -> f64 {
    let tokens = f64::from(tokens);
    (tokens * INPUT_SHARE / 1000.0) * model.cost_per_input_unit
        + (tokens * OUTPUT_SHARE / 1000.0) * model.cost_per_output_unit
}

/// Category-relevant capability contribution before the complexity multiplier.
fn category_capability(caps: &CapabilityVector, category: Category) -> f64 {
    match category {
        Category::Coding => caps.coding * CATEGORY_WEIGHT,
        Category::Creative => caps.creativity * CATEGORY_WEIGHT,
        Category::Analysis => caps.analysis * CATEGORY_WEIGHT,
        Category::Math | Category::Medical => caps.reasoning * CATEGORY_WEIGHT,
        Category::Translation | Category::General => {
            (caps.reasoning + caps.creativity) * BLENDED_WEIGHT
        }
    }
}

/// Score one candidate. Never negative.
pub fn score_model(
    model: &ModelDescriptor,
    classification: &Classification,
    user: &UserContext,
    estimated_cost: f64,
) -> f64 {
    let caps = &model.capabilities;
    let mut score = category_capability(caps, classification.category)
        * classification.complexity.score_multiplier();
    score += caps.cost_efficiency * COST_EFFICIENCY_WEIGHT;
    score += caps.speed * SPEED_WEIGHT;

    if user.prefers(&model.id) {
        score += PREFERENCE_BONUS;
    }
    if estimated_cost > user.remaining_budget * BUDGET_PRESSURE {
        score *= BUDGET_PENALTY;
    }
    score.max(0.0)
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    model: &'a ModelDescriptor,
    score: f64,
    cost: f64,
}

#[derive(Debug, Clone)]
pub struct WeightedSelector {
    catalog: ModelCatalog,
    fallback: FallbackModel,
}

impl WeightedSelector {
    pub fn new(catalog: ModelCatalog, fallback: FallbackModel) -> Self {
        Self { catalog, fallback }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Score every catalog model in `tiers` whose context window holds the
    /// request and pick the best one the user can afford, or the cheapest
    /// when none fits the budget.
    pub fn select_from(
        &self,
        text: &str,
        classification: &Classification,
        user: &UserContext,
        tiers: &TierSet,
    ) -> RoutingDecision {
        let tokens = estimate_tokens(text, classification);

        let mut candidates: Vec<Candidate<'_>> = self
            .catalog
            .in_tiers(tiers)
            .filter(|model| tokens <= model.context_window)
            .map(|model| {
                let cost = estimate_cost(model, tokens);
                Candidate {
                    model,
                    score: score_model(model, classification, user, cost),
                    cost,
                }
            })
            .collect();

        if candidates.is_empty() {
            debug!(tokens, "no entitled model has a large enough context window");
            return self.fallback.no_model_available(StrategyKind::Weighted);
        }

        // Stable sort: equal scores keep catalog order.
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        match candidates
            .iter()
            .position(|c| c.cost <= user.remaining_budget)
        {
            Some(index) => {
                let selected = candidates[index];
                let others = || {
                    candidates
                        .iter()
                        .enumerate()
                        .filter(move |(i, _)| *i != index)
                        .map(|(_, c)| c)
                };
                let confidence = match others().next() {
                    Some(runner_up) => {
                        (0.5 + (selected.score - runner_up.score) / 10.0).clamp(0.0, 1.0)
                    }
                    None => 1.0,
                };
                let alternatives = others()
                    .take(MAX_ALTERNATIVES)
                    .map(|c| c.model.id.clone())
                    .collect();

                debug!(
                    model = %selected.model.id,
                    score = selected.score,
                    cost = selected.cost,
                    tokens,
                    "weighted selection"
                );
                self.decision(
                    &selected,
                    tokens,
                    build_reason(&selected.model.id, classification),
                    confidence,
                    alternatives,
                    FallbackKind::None,
                )
            }
            None => {
                // Every candidate exceeds the budget: cheapest wins, first on ties.
                let mut cheapest = candidates[0];
                for candidate in &candidates[1..] {
                    if candidate.cost < cheapest.cost {
                        cheapest = *candidate;
                    }
                }
                info!(
                    model = %cheapest.model.id,
                    cost = cheapest.cost,
                    remaining_budget = user.remaining_budget,
                    "no candidate within budget, using cheapest model"
                );
                self.decision(
                    &cheapest,
                    tokens,
                    format!(
                        "{}: most cost-effective model under budget constraint",
                        display_name(&cheapest.model.id)
                    ),
                    BUDGET_FALLBACK_CONFIDENCE,
                    Vec::new(),
                    FallbackKind::BudgetConstraint,
                )
            }
        }
    }

    fn decision(
        &self,
        candidate: &Candidate<'_>,
        tokens: u32,
        reason: String,
        confidence: f64,
        alternatives: Vec<String>,
        fallback: FallbackKind,
    ) -> RoutingDecision {
        RoutingDecision {
            selected_model_id: candidate.model.id.clone(),
            provider_id: candidate.model.provider_id.clone(),
            reason,
            confidence,
            alternative_model_ids: alternatives,
            estimated_cost: Some(candidate.cost),
            estimated_tokens: Some(tokens),
            tier: candidate.model.tier,
            strategy: StrategyKind::Weighted,
            fallback,
        }
    }
}

impl SelectionStrategy for WeightedSelector {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Weighted
    }

    fn select(&self, input: &SelectionInput<'_>) -> RoutingDecision {
        self.select_from(input.text, input.classification, input.user, input.tiers)
    }
}
