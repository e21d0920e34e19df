// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The selection-strategy seam shared by affinity and weighted selection.

use modelgate_core::{
    Classification, FallbackKind, RoutingDecision, StrategyKind, Tier, TierSet, UserContext,
};

use crate::catalog::AvailableModel;

/// Confidence attached to the hardcoded last-resort decision.
pub const NO_MODEL_CONFIDENCE: f64 = 0.1;

/// Everything a strategy may look at for one request.
#[derive(Debug, Clone, Copy)]
pub struct SelectionInput<'a> {
    /// Request text with any override prefix removed.
    pub text: &'a str,
    pub classification: &'a Classification,
    pub user: &'a UserContext,
    /// Tiers the identity is entitled to.
    pub tiers: &'a TierSet,
    /// Entitlement-filtered models the caller can dispatch to.
    pub available: &'a [AvailableModel],
}

/// A model selection algorithm. Implementations never mutate shared state.
pub trait SelectionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn select(&self, input: &SelectionInput<'_>) -> RoutingDecision;
}

/// Minimal default returned when nothing at all is selectable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackModel {
    pub id: String,
    pub provider_id: String,
}

impl FallbackModel {
    pub fn new(id: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider_id: provider_id.into(),
        }
    }

    /// The "no model available" decision.
    pub fn no_model_available(&self, strategy: StrategyKind) -> RoutingDecision {
        RoutingDecision {
            selected_model_id: self.id.clone(),
            provider_id: self.provider_id.clone(),
            reason: format!(
                "no model available, using minimal default {}",
                crate::reason::display_name(&self.id)
            ),
            confidence: NO_MODEL_CONFIDENCE,
            alternative_model_ids: Vec::new(),
            estimated_cost: None,
            estimated_tokens: None,
            tier: Tier::Budget,
            strategy,
            fallback: FallbackKind::NoModelAvailable,
        }
    }
}
