// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics.
//!
//! Routing tables are large and hand-edited, so a misspelt section or key
//! (`[afinity.coding]`, `identity_limt`) is the most common mistake. Each
//! Figment error becomes a [`ConfigError`] that names the offending table,
//! suggests the closest valid key and, when the key can be found in the
//! file, points at it.

#![allow(unused_assignments)] // emitted by the Diagnostic derive

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key needs before it is offered as a hint.
const HINT_MIN_SIMILARITY: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {table}")]
    #[diagnostic(
        code(modelgate::config::unknown_key),
        help("{}", unknown_key_hint(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Table the key appeared in, e.g. `[rate_limit.chat]`.
        table: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("unknown key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(modelgate::config::invalid_type), help("use {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("`{key}` is required")]
    #[diagnostic(
        code(modelgate::config::missing_key),
        help("set `{key}` in modelgate.toml")
    )]
    MissingKey { key: String },

    /// Parsed, but the routing tables are inconsistent.
    #[error("invalid routing configuration: {message}")]
    #[diagnostic(code(modelgate::config::validation))]
    Validation { message: String },

    #[error("{0}")]
    #[diagnostic(code(modelgate::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ConfigError::Validation {
            message: message.into(),
        }
    }
}

fn unknown_key_hint(suggestion: Option<&str>, valid_keys: &str) -> String {
    let Some(suggestion) = suggestion else {
        return format!("expected one of: {valid_keys}");
    };
    format!("perhaps `{suggestion}`? Expected one of: {valid_keys}")
}

fn table_label(path: &[String]) -> String {
    if path.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{}]", path.join("."))
    }
}

fn dotted(path: &[String], field: &str) -> String {
    path.iter()
        .map(String::as_str)
        .chain(std::iter::once(field))
        .collect::<Vec<_>>()
        .join(".")
}

/// Convert every error carried by a `figment::Error` into a diagnostic.
///
/// `toml_sources` pairs file paths with their contents so unknown keys can
/// be located in the file that declared them.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert(&error, toml_sources))
        .collect()
}

fn convert(error: &figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let suggestion = suggest_key(field, expected);
            let located = locate(error, field, toml_sources);
            let (span, src) = match located {
                Some((span, src)) => (Some(span), Some(src)),
                None => (None, None),
            };
            ConfigError::UnknownKey {
                key: field.clone(),
                table: table_label(&error.path),
                suggestion,
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: dotted(&error.path, field),
        },
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: error.path.join("."),
            detail: format!("got {actual}"),
            expected: expected.to_string(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Span of `field` inside the file the error came from.
fn locate(
    error: &figment::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let figment::Source::File(origin) = error.metadata.as_ref()?.source.as_ref()? else {
        return None;
    };
    let origin = origin.display().to_string();
    let (name, content) = toml_sources.iter().find(|(path, _)| *path == origin)?;
    let offset = find_key_offset(content, &error.path, field)?;
    Some((
        SourceSpan::new(offset.into(), field.len()),
        NamedSource::new(name, content.clone()),
    ))
}

/// Byte offset of the line declaring `field` under the `[path]` table.
///
/// An empty path searches from the start of the file.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path {
        [] => 0,
        _ => {
            let header = format!("[{}]", path.join("."));
            content.find(&header)? + header.len()
        }
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let declares = line
            .trim_start()
            .strip_prefix(field)
            .is_some_and(|rest| rest.trim_start().starts_with('='));
        if declares {
            return Some(offset + indent);
        }
        offset += line.len();
    }
    None
}

/// Closest valid key to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    let (score, best) = valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .max_by(|a, b| a.0.total_cmp(&b.0))?;
    (score > HINT_MIN_SIMILARITY).then(|| best.to_string())
}

/// Print every diagnostic to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    if errors.len() > 1 {
        eprintln!("{} configuration problems found", errors.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_identity_limit_for_typo() {
        let valid = &[
            "address_limit",
            "address_window_secs",
            "identity_limit",
            "identity_window_secs",
        ];
        assert_eq!(
            suggest_key("identity_limt", valid),
            Some("identity_limit".to_string())
        );
    }

    #[test]
    fn suggests_affinity_section() {
        let valid = &["gateway", "routing", "classifier", "tiers", "affinity"];
        assert_eq!(suggest_key("afinity", valid), Some("affinity".to_string()));
    }

    #[test]
    fn unrelated_key_gets_no_hint() {
        assert_eq!(suggest_key("zzzzzz", &["max_messages", "max_tokens", "locale"]), None);
        assert_eq!(suggest_key("anything", &[]), None);
    }

    #[test]
    fn finds_key_in_nested_table() {
        let content = "[rate_limit]\nsweep_interval_secs = 60\n\n[rate_limit.chat]\nidentity_limt = 3\n";
        let path = vec!["rate_limit".to_string(), "chat".to_string()];
        let offset = find_key_offset(content, &path, "identity_limt").unwrap();
        assert_eq!(&content[offset..offset + 13], "identity_limt");
    }

    #[test]
    fn key_prefix_is_not_a_match() {
        let content = "[quota]\nmax_messages_total = 1\nmax_messages = 5\n";
        let path = vec!["quota".to_string()];
        let offset = find_key_offset(content, &path, "max_messages").unwrap();
        assert_eq!(&content[offset..offset + 14], "max_messages =");
    }

    #[test]
    fn missing_table_yields_no_offset() {
        let content = "[quota]\nmax_messages = 5\n";
        let path = vec!["routing".to_string()];
        assert_eq!(find_key_offset(content, &path, "strategy"), None);
    }

    #[test]
    fn dotted_key_and_table_labels() {
        let path = ["tiers".to_string(), "plans".to_string()];
        assert_eq!(dotted(&path, "tiers"), "tiers.plans.tiers");
        assert_eq!(dotted(&[], "catalog"), "catalog");
        assert_eq!(table_label(&path), "[tiers.plans]");
        assert_eq!(table_label(&[]), "the top level");
    }
}
