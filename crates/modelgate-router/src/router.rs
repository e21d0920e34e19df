// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing service: classification, tier resolution and model selection
//! behind one reloadable set of tables.

use std::sync::Arc;

use arc_swap::ArcSwap;
use modelgate_config::ModelgateConfig;
use modelgate_config::model::RoutingConfig;
use modelgate_core::{
    Classification, FallbackKind, RoutingDecision, StrategyKind, TierSet, UserContext,
};
use tracing::{debug, info, warn};

use crate::affinity::AffinitySelector;
use crate::catalog::{AvailableModel, ModelCatalog};
use crate::classifier::PromptClassifier;
use crate::strategy::{FallbackModel, SelectionInput, SelectionStrategy};
use crate::tiers::{ModelTierIndex, TierResolver};
use crate::weighted::{WeightedSelector, estimate_cost, estimate_tokens};

const PINNED_CONFIDENCE: f64 = 1.0;

/// Split a leading `/model <id> ` override off the request text.
///
/// Returns the requested id and the remaining text. Text without a
/// well-formed prefix is returned unchanged.
pub fn parse_model_override(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix("/model ") else {
        return (None, text);
    };
    let rest = rest.trim_start();
    match rest.split_once(char::is_whitespace) {
        Some((id, remainder)) if !id.is_empty() => (Some(id), remainder.trim_start()),
        _ => (None, text),
    }
}

/// Immutable routing tables built from one configuration snapshot.
#[derive(Debug, Clone)]
pub struct RoutingTables {
    pub classifier: PromptClassifier,
    pub tier_resolver: TierResolver,
    pub tier_index: ModelTierIndex,
    pub affinity: AffinitySelector,
    pub weighted: WeightedSelector,
    pub routing: RoutingConfig,
}

impl RoutingTables {
    pub fn from_config(config: &ModelgateConfig) -> Self {
        let tier_index = ModelTierIndex::from_config(&config.tiers);
        let fallback = FallbackModel::new(
            config.routing.fallback_model.clone(),
            config.routing.fallback_provider.clone(),
        );
        Self {
            classifier: PromptClassifier::from_config(&config.classifier),
            tier_resolver: TierResolver::from_config(&config.tiers),
            affinity: AffinitySelector::new(
                config.affinity.clone(),
                tier_index.clone(),
                fallback.clone(),
            ),
            weighted: WeightedSelector::new(ModelCatalog::new(config.catalog.clone()), fallback),
            tier_index,
            routing: config.routing.clone(),
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        self.weighted.catalog()
    }

    pub fn strategy(&self, kind: StrategyKind) -> &dyn SelectionStrategy {
        match kind {
            StrategyKind::Affinity => &self.affinity,
            StrategyKind::Weighted => &self.weighted,
        }
    }
}

/// One routing request.
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    pub text: &'a str,
    pub has_attachments: bool,
    pub user: &'a UserContext,
    /// Caller-supplied available set. Derived from the catalog when absent.
    pub available: Option<&'a [AvailableModel]>,
    /// Overrides the configured strategy for this request.
    pub strategy: Option<StrategyKind>,
}

impl<'a> RouteRequest<'a> {
    pub fn new(text: &'a str, user: &'a UserContext) -> Self {
        Self {
            text,
            has_attachments: false,
            user,
            available: None,
            strategy: None,
        }
    }
}

/// Everything the router worked out for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
    pub classification: Classification,
    pub tiers: TierSet,
    pub decision: RoutingDecision,
}

/// Reloadable routing service. Reads are lock-free; `reload` swaps the whole
/// table set atomically so a request never sees a half-applied config.
#[derive(Debug)]
pub struct ModelRouter {
    tables: ArcSwap<RoutingTables>,
}

impl ModelRouter {
    pub fn new(config: &ModelgateConfig) -> Self {
        Self {
            tables: ArcSwap::from_pointee(RoutingTables::from_config(config)),
        }
    }

    /// Replace the routing tables. In-flight requests keep the old snapshot.
    pub fn reload(&self, config: &ModelgateConfig) {
        self.tables.store(Arc::new(RoutingTables::from_config(config)));
        info!(
            catalog_models = config.catalog.len(),
            strategy = %config.routing.strategy,
            "routing tables reloaded"
        );
    }

    /// Current table snapshot.
    pub fn tables(&self) -> Arc<RoutingTables> {
        self.tables.load_full()
    }

    pub fn classify(&self, text: &str, has_attachments: bool) -> Classification {
        self.tables.load().classifier.classify(text, has_attachments)
    }

    pub fn resolve_tiers(&self, plan_code: &str) -> TierSet {
        self.tables.load().tier_resolver.resolve_tiers(plan_code)
    }

    /// Run one strategy directly against a prepared input.
    pub fn select_model(&self, kind: StrategyKind, input: &SelectionInput<'_>) -> RoutingDecision {
        self.tables.load().strategy(kind).select(input)
    }

    /// Classify, resolve tiers and select a model for one request.
    pub fn route(&self, request: &RouteRequest<'_>) -> RouteOutcome {
        let tables = self.tables.load();
        let (override_id, text) = if tables.routing.allow_model_override {
            parse_model_override(request.text)
        } else {
            (None, request.text)
        };

        let classification = tables.classifier.classify(text, request.has_attachments);
        let tiers = tables.tier_resolver.resolve_tiers(&request.user.plan_code);
        let kind = request.strategy.unwrap_or(tables.routing.strategy);

        if let Some(id) = override_id {
            match accept_override(&tables, id, text, &classification, &tiers, request, kind) {
                Ok(decision) => {
                    debug!(model = id, tier = %decision.tier, "model override accepted");
                    return RouteOutcome {
                        classification,
                        tiers,
                        decision,
                    };
                }
                Err(rejection) => warn!(
                    model = id,
                    plan = %request.user.plan_code,
                    rejection,
                    "model override rejected, selecting normally"
                ),
            }
        }

        if let Some(forced) = tables.routing.force_model.as_deref() {
            let decision = pinned(
                &tables,
                forced,
                text,
                &classification,
                kind,
                "forced by configuration",
            );
            return RouteOutcome {
                classification,
                tiers,
                decision,
            };
        }

        let derived;
        let available = match request.available {
            Some(available) => available,
            None => {
                derived = tables.catalog().available_for(&tiers);
                derived.as_slice()
            }
        };

        let input = SelectionInput {
            text,
            classification: &classification,
            user: request.user,
            tiers: &tiers,
            available,
        };
        let decision = tables.strategy(kind).select(&input);

        debug!(
            model = %decision.selected_model_id,
            category = %classification.category,
            complexity = %classification.complexity,
            strategy = %kind,
            fallback = %decision.fallback,
            confidence = decision.confidence,
            "routing decision"
        );

        RouteOutcome {
            classification,
            tiers,
            decision,
        }
    }
}

/// Pin a `/model` override if the caller may use it.
///
/// The model must be in the catalog, in an entitled tier and, when the
/// caller supplied an available set, in that set. Weighted routing also
/// refuses an override the remaining budget cannot cover.
fn accept_override(
    tables: &RoutingTables,
    model_id: &str,
    text: &str,
    classification: &Classification,
    tiers: &TierSet,
    request: &RouteRequest<'_>,
    kind: StrategyKind,
) -> Result<RoutingDecision, &'static str> {
    let model = tables
        .catalog()
        .get(model_id)
        .ok_or("model is not in the catalog")?;
    if !tiers.contains(model.tier) {
        return Err("model is outside the entitled tiers");
    }
    if let Some(available) = request.available {
        if !available.iter().any(|m| m.id == model.id) {
            return Err("model is not in the available set");
        }
    }

    let decision = pinned(tables, model_id, text, classification, kind, "requested via /model");
    let over_budget = decision
        .estimated_cost
        .is_some_and(|cost| cost > request.user.remaining_budget);
    if kind == StrategyKind::Weighted && over_budget {
        return Err("estimated cost exceeds the remaining budget");
    }
    Ok(decision)
}

/// Decision for a model chosen outside the selectors.
fn pinned(
    tables: &RoutingTables,
    model_id: &str,
    text: &str,
    classification: &Classification,
    kind: StrategyKind,
    why: &str,
) -> RoutingDecision {
    let descriptor = tables.catalog().get(model_id);
    let tokens = descriptor.map(|_| estimate_tokens(text, classification));
    RoutingDecision {
        selected_model_id: model_id.to_string(),
        provider_id: descriptor
            .map(|m| m.provider_id.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        reason: format!("{}: {why}", crate::reason::display_name(model_id)),
        confidence: PINNED_CONFIDENCE,
        alternative_model_ids: Vec::new(),
        estimated_cost: descriptor.zip(tokens).map(|(m, t)| estimate_cost(m, t)),
        estimated_tokens: tokens,
        tier: descriptor
            .map(|m| m.tier)
            .unwrap_or_else(|| tables.tier_index.resolve(model_id)),
        strategy: kind,
        fallback: FallbackKind::None,
    }
}
