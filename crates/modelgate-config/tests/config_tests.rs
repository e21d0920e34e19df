// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the modelgate configuration system.

use modelgate_config::diagnostic::ConfigError;
use modelgate_config::model::{LedgerBackend, ModelgateConfig, QuotaLocale};
use modelgate_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use modelgate_core::{Category, StrategyKind, Tier};

#[test]
fn empty_toml_uses_builtin_tables() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.gateway.name, "modelgate");
    assert_eq!(config.gateway.log_level, "info");
    assert_eq!(config.routing.strategy, StrategyKind::Weighted);
    assert_eq!(config.rate_limit.chat.address_limit, 30);
    assert_eq!(config.rate_limit.chat.identity_limit, 10);
    assert_eq!(config.rate_limit.sweep_interval_secs, 300);
    assert_eq!(config.quota.max_messages, 10);
    assert_eq!(config.quota.max_tokens, 50_000);
    assert_eq!(config.quota.locale, QuotaLocale::Vi);
    assert!(config.quota.reset_period_days.is_none());
    assert_eq!(config.ledger.backend, LedgerBackend::Memory);
    assert!(!config.catalog.is_empty());
    assert!(config.tiers.plans.contains_key("vn_pro"));
}

#[test]
fn overrides_merge_over_defaults() {
    let toml = r#"
[routing]
strategy = "affinity"

[rate_limit.chat]
address_limit = 5
address_window_secs = 10
identity_limit = 2
identity_window_secs = 10

[quota]
max_messages = 3
locale = "en"

[tiers.plans.enterprise]
tiers = [1, 2, 3]
paid = true
"#;

    let config = load_and_validate_str(toml).expect("valid overrides");
    assert_eq!(config.routing.strategy, StrategyKind::Affinity);
    assert_eq!(config.rate_limit.chat.identity_limit, 2);
    assert_eq!(config.rate_limit.api.address_limit, 20);
    assert_eq!(config.quota.max_messages, 3);
    assert_eq!(config.quota.locale, QuotaLocale::En);
    let enterprise = &config.tiers.plans["enterprise"];
    assert_eq!(enterprise.tiers, vec![Tier::Budget, Tier::Standard, Tier::Premium]);
    // Built-in plans survive alongside the added one.
    assert!(config.tiers.plans.contains_key("free"));
}

#[test]
fn catalog_array_replaces_default_catalog() {
    let toml = r#"
[[catalog]]
id = "local-small"
provider_id = "local"
tier = 1
cost_per_input_unit = 0.0
cost_per_output_unit = 0.0
context_window = 8192

[catalog.capabilities]
reasoning = 4.0
creativity = 4.0
coding = 5.0
analysis = 4.0
speed = 9.0
cost_efficiency = 10.0

[quota]
trial_models = ["local-small"]
fallback_model = "local-small"
"#;

    let config = load_and_validate_str(toml).expect("custom catalog");
    assert_eq!(config.catalog.len(), 1);
    assert_eq!(config.catalog[0].id, "local-small");
    assert_eq!(config.catalog[0].tier, Tier::Budget);
}

#[test]
fn affinity_table_override_is_per_category() {
    let toml = r#"
[affinity.coding]
tier1 = ["local-coder"]
tier2 = []
tier3 = []
"#;

    let config = load_and_validate_str(toml).expect("affinity override");
    assert_eq!(
        config.affinity.for_category(Category::Coding).tier1,
        vec!["local-coder".to_string()]
    );
    assert!(!config.affinity.for_category(Category::Creative).tier1.is_empty());
}

#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[quota]
max_mesages = 5
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. }
            if key == "max_mesages" && s == "max_messages"
    )));
}

#[test]
fn out_of_range_tier_is_rejected() {
    let toml = r#"
[tiers.plans.broken]
tiers = [4]
"#;

    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn invalid_strategy_is_rejected() {
    let toml = r#"
[routing]
strategy = "random"
"#;

    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn validation_errors_surface_through_loader() {
    let toml = r#"
[quota]
max_messages = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero ceiling is invalid");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("max_messages"))
    ));
}

#[test]
fn serialized_defaults_validate() {
    let config = ModelgateConfig::default();
    assert!(modelgate_config::validation::validate_config(&config).is_ok());
}

#[test]
fn loads_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modelgate.toml");
    std::fs::write(&path, "[gateway]\nname = \"edge-1\"\n").unwrap();

    let config = load_and_validate_path(&path).expect("file config");
    assert_eq!(config.gateway.name, "edge-1");
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let config = load_and_validate_path(std::path::Path::new("/nonexistent/modelgate.toml"))
        .expect("missing file is skipped");
    assert_eq!(config.gateway.name, "modelgate");
}

#[test]
#[serial_test::serial]
fn env_var_overrides_nested_profile() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("MODELGATE_RATE_LIMIT_CHAT_IDENTITY_LIMIT", "4");
        jail.set_env("MODELGATE_GATEWAY_LOG_LEVEL", "debug");
        let config = modelgate_config::load_config().expect("env override");
        assert_eq!(config.rate_limit.chat.identity_limit, 4);
        assert_eq!(config.gateway.log_level, "debug");
        Ok(())
    });
}
