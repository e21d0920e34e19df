// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./modelgate.toml` > `~/.config/modelgate/modelgate.toml` >
//! `/etc/modelgate/modelgate.toml`, with `MODELGATE_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ModelgateConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/modelgate/modelgate.toml";

/// Local configuration file, relative to the working directory.
pub const LOCAL_CONFIG_PATH: &str = "modelgate.toml";

/// Config sections reachable from the environment. Longer names come first so
/// `MODELGATE_RATE_LIMIT_CHAT_...` is not split at `rate_`.
const ENV_SECTIONS: [&str; 9] = [
    "rate_limit",
    "classifier",
    "gateway",
    "routing",
    "metrics",
    "ledger",
    "quota",
    "tiers",
    "affinity",
];

/// Nested tables one level below a section.
const ENV_SUBSECTIONS: [&str; 4] = ["chat", "api", "payment", "newsletter"];

/// User configuration file under the XDG config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("modelgate/modelgate.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/modelgate/modelgate.toml`
/// 3. `~/.config/modelgate/modelgate.toml`
/// 4. `./modelgate.toml`
/// 5. `MODELGATE_*` environment variables
pub fn load_config() -> Result<ModelgateConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the compiled defaults (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ModelgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ModelgateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ModelgateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ModelgateConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ModelgateConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env key to a dotted config path.
///
/// Uses explicit section names instead of `Env::split("_")` because most
/// keys contain underscores: `rate_limit_chat_identity_limit` must become
/// `rate_limit.chat.identity_limit`, not `rate.limit.chat.identity.limit`.
pub fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        else {
            continue;
        };
        for sub in ENV_SUBSECTIONS {
            if let Some(field) = rest.strip_prefix(sub).and_then(|r| r.strip_prefix('_')) {
                return format!("{section}.{sub}.{field}");
            }
        }
        return format!("{section}.{rest}");
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("MODELGATE_").map(|key| map_env_key(key.as_str()).into())
}
