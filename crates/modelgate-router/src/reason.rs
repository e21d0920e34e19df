// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable routing reasons.

use modelgate_core::Classification;

/// Display name for a model id.
///
/// Strips a leading `provider/` segment and a trailing date-like suffix
/// (`-` followed by eight or more digits), turns `-` and `_` into spaces,
/// and capitalizes each word: `anthropic/claude-sonnet-4-20250514` becomes
/// `Claude Sonnet 4`.
pub fn display_name(model_id: &str) -> String {
    let without_provider = model_id
        .split_once('/')
        .map_or(model_id, |(_, rest)| rest);

    let without_date = match without_provider.rsplit_once('-') {
        Some((head, tail)) if tail.len() >= 8 && tail.chars().all(|c| c.is_ascii_digit()) => head,
        _ => without_provider,
    };

    let mut name = String::with_capacity(without_date.len());
    let mut at_word_start = true;
    for c in without_date.chars() {
        let c = if c == '-' || c == '_' { ' ' } else { c };
        if c.is_alphanumeric() {
            if at_word_start {
                name.extend(c.to_uppercase());
            } else {
                name.push(c);
            }
            at_word_start = false;
        } else {
            name.push(c);
            at_word_start = true;
        }
    }
    name
}

/// Reason string for a normal selection.
pub fn build_reason(model_id: &str, classification: &Classification) -> String {
    format!(
        "{}: optimized for {} ({})",
        display_name(model_id),
        classification.category.label(),
        classification.complexity.label()
    )
}
