// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures.

use modelgate_config::ModelgateConfig;
use modelgate_core::{QueryHistory, UserContext};

/// Default configuration with metrics disabled.
pub fn test_config() -> ModelgateConfig {
    let mut config = ModelgateConfig::default();
    config.metrics.enabled = false;
    config
}

/// A user context with an empty history.
pub fn user(identity: &str, plan_code: &str, remaining_budget: f64) -> UserContext {
    UserContext::new(
        identity,
        plan_code,
        remaining_budget,
        Vec::new(),
        QueryHistory::with_capacity(8),
    )
}

/// A coding prompt of exactly `len` characters mentioning "implement" and
/// "algorithm", padded with a filler that matches no keyword.
pub fn coding_prompt(len: usize) -> String {
    let mut text = String::from("implement a fast sorting algorithm ");
    while text.chars().count() < len {
        text.push('x');
    }
    text
}

pub const AUTUMN_POEM: &str = "viết một bài thơ về mùa thu";
