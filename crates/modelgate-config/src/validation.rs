// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for routing tables.
//!
//! Serde enforces shape; this module enforces the cross-table constraints
//! the router relies on: capability scores in range, unique catalog ids,
//! non-zero rate-limit ceilings, and a trial fallback that trials may use
//! and the catalog can price.

use std::collections::HashSet;

use modelgate_core::Category;

use crate::diagnostic::ConfigError;
use crate::model::{ModelgateConfig, RateLimitProfile};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure rather than stopping at the first.
pub fn validate_config(config: &ModelgateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.gateway.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "gateway.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.gateway.log_level
        )));
    }

    if config.gateway.history_idle_secs == 0 {
        errors.push(ConfigError::validation(
            "gateway.history_idle_secs must be at least 1",
        ));
    }

    validate_classifier(config, &mut errors);
    validate_tiers(config, &mut errors);
    validate_affinity(config, &mut errors);
    validate_catalog(config, &mut errors);
    validate_rate_limits(config, &mut errors);
    validate_quota(config, &mut errors);
    validate_catalog_references(config, &mut errors);

    if config.routing.fallback_model.trim().is_empty() {
        errors.push(ConfigError::validation(
            "routing.fallback_model must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_classifier(config: &ModelgateConfig, errors: &mut Vec<ConfigError>) {
    let c = &config.classifier;
    if !(c.short_prompt_chars <= c.medium_length_chars
        && c.medium_length_chars <= c.complex_length_chars)
    {
        errors.push(ConfigError::validation(format!(
            "classifier thresholds must satisfy short_prompt_chars ({}) <= medium_length_chars ({}) <= complex_length_chars ({})",
            c.short_prompt_chars, c.medium_length_chars, c.complex_length_chars
        )));
    }

    let lists = [
        ("complex_keywords", &c.complex_keywords),
        ("medium_keywords", &c.medium_keywords),
    ];
    for (name, list) in lists {
        if list.iter().any(|k| k.trim().is_empty()) {
            errors.push(ConfigError::validation(format!(
                "classifier.{name} must not contain empty keywords"
            )));
        }
    }

    for category in Category::SCORED {
        if c.categories
            .for_category(category)
            .iter()
            .any(|k| k.trim().is_empty())
        {
            errors.push(ConfigError::validation(format!(
                "classifier.categories.{category} must not contain empty keywords"
            )));
        }
    }
}

fn validate_tiers(config: &ModelgateConfig, errors: &mut Vec<ConfigError>) {
    if config.tiers.plans.is_empty() {
        errors.push(ConfigError::validation(
            "tiers.plans must define at least one plan",
        ));
    }

    for (code, plan) in &config.tiers.plans {
        if plan.tiers.is_empty() {
            errors.push(ConfigError::validation(format!(
                "tiers.plans.{code}.tiers must not be empty"
            )));
        }
        if code.trim() != code || code.to_lowercase() != *code {
            errors.push(ConfigError::validation(format!(
                "plan code `{code}` must be lowercase without surrounding whitespace"
            )));
        }
    }
}

fn validate_affinity(config: &ModelgateConfig, errors: &mut Vec<ConfigError>) {
    for category in Category::SCORED.into_iter().chain([Category::General]) {
        let table = config.affinity.for_category(category);
        if table.tier1.is_empty() {
            errors.push(ConfigError::validation(format!(
                "affinity.{category}.tier1 must list at least one model"
            )));
        }
    }
}

fn validate_catalog(config: &ModelgateConfig, errors: &mut Vec<ConfigError>) {
    let mut seen = HashSet::new();
    for (i, model) in config.catalog.iter().enumerate() {
        if model.id.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "catalog[{i}].id must not be empty"
            )));
        }
        if !seen.insert(model.id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate model id `{}` in [[catalog]]",
                model.id
            )));
        }
        for (dimension, value) in model.capabilities.dimensions() {
            if !(0.0..=10.0).contains(&value) {
                errors.push(ConfigError::validation(format!(
                    "catalog `{}` capability {dimension} must be within 0..=10, got {value}",
                    model.id
                )));
            }
        }
        if model.cost_per_input_unit < 0.0 || model.cost_per_output_unit < 0.0 {
            errors.push(ConfigError::validation(format!(
                "catalog `{}` costs must be non-negative",
                model.id
            )));
        }
    }
}

fn validate_profile(name: &str, profile: &RateLimitProfile, errors: &mut Vec<ConfigError>) {
    if profile.address_limit == 0 || profile.identity_limit == 0 {
        errors.push(ConfigError::validation(format!(
            "rate_limit.{name} limits must be at least 1"
        )));
    }
    if profile.address_window_secs == 0 || profile.identity_window_secs == 0 {
        errors.push(ConfigError::validation(format!(
            "rate_limit.{name} windows must be at least 1 second"
        )));
    }
}

fn validate_rate_limits(config: &ModelgateConfig, errors: &mut Vec<ConfigError>) {
    let rl = &config.rate_limit;
    if rl.sweep_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "rate_limit.sweep_interval_secs must be at least 1",
        ));
    }
    validate_profile("chat", &rl.chat, errors);
    validate_profile("api", &rl.api, errors);
    validate_profile("payment", &rl.payment, errors);
    validate_profile("newsletter", &rl.newsletter, errors);
}

fn validate_quota(config: &ModelgateConfig, errors: &mut Vec<ConfigError>) {
    let q = &config.quota;
    if q.max_messages == 0 {
        errors.push(ConfigError::validation("quota.max_messages must be at least 1"));
    }
    if q.max_tokens == 0 {
        errors.push(ConfigError::validation("quota.max_tokens must be at least 1"));
    }
    if q.reset_period_days == Some(0) {
        errors.push(ConfigError::validation(
            "quota.reset_period_days must be at least 1 when set",
        ));
    }
    if q.trial_models.is_empty() {
        errors.push(ConfigError::validation(
            "quota.trial_models must list at least one model",
        ));
    }
    if !q.trial_models.iter().any(|m| m == &q.fallback_model) {
        errors.push(ConfigError::validation(format!(
            "quota.fallback_model `{}` must appear in quota.trial_models",
            q.fallback_model
        )));
    }
}

/// Models the gateway can pin without selection must be priced by the catalog.
fn validate_catalog_references(config: &ModelgateConfig, errors: &mut Vec<ConfigError>) {
    let catalog: HashSet<&str> = config.catalog.iter().map(|m| m.id.as_str()).collect();
    let mut require = |field: String, model: &str| {
        if !catalog.contains(model) {
            errors.push(ConfigError::validation(format!(
                "{field} `{model}` is not in [[catalog]]"
            )));
        }
    };

    require("quota.fallback_model".to_string(), &config.quota.fallback_model);
    if let Some(forced) = &config.routing.force_model {
        require("routing.force_model".to_string(), forced);
    }

    // A plan default only stands in for a trial model when trials may use it.
    let q = &config.quota;
    for (code, plan) in &config.tiers.plans {
        let Some(default_model) = &plan.default_model else {
            continue;
        };
        if !plan.paid && q.trial_models.iter().any(|m| m == default_model) {
            require(format!("tiers.plans.{code}.default_model"), default_model);
        }
    }
}
