// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt classification, tier resolution and model selection for modelgate.
//!
//! This crate provides:
//! - [`PromptClassifier`]: keyword-driven category, complexity and language detection
//! - [`TierResolver`] and [`ModelTierIndex`]: plan and model tier lookups
//! - [`AffinitySelector`]: affinity-table walk over an available set
//! - [`WeightedSelector`]: capability scoring with cost estimation and a budget guard
//! - [`ModelRouter`]: reloadable service tying the above together, with
//!   per-message `/model` overrides

pub mod affinity;
pub mod catalog;
pub mod classifier;
pub mod reason;
pub mod router;
pub mod strategy;
pub mod tiers;
pub mod weighted;

pub use affinity::AffinitySelector;
pub use catalog::{AvailableModel, ModelCatalog, bare_model_id, same_model};
pub use classifier::PromptClassifier;
pub use reason::{build_reason, display_name};
pub use router::{ModelRouter, RouteOutcome, RouteRequest, RoutingTables, parse_model_override};
pub use strategy::{FallbackModel, SelectionInput, SelectionStrategy};
pub use tiers::{ModelTierIndex, TierResolver};
pub use weighted::{WeightedSelector, estimate_cost, estimate_tokens, score_model};
