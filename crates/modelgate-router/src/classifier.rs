// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-driven prompt classification.
//!
//! Derives category, complexity and language from raw request text using
//! configured keyword tables. No LLM pre-call, no network, no latency.

use std::collections::HashSet;

use modelgate_config::model::ClassifierConfig;
use modelgate_core::{Category, Classification, Complexity, Language};

/// Keyword-driven classifier. Build once per configuration and share.
#[derive(Debug, Clone)]
pub struct PromptClassifier {
    complex_keywords: Vec<String>,
    medium_keywords: Vec<String>,
    /// Scored categories in tie-break order.
    category_keywords: Vec<(Category, Vec<String>)>,
    diacritics: HashSet<char>,
    short_prompt_chars: usize,
    medium_length_chars: usize,
    complex_length_chars: usize,
}

fn lowercase_all(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

impl PromptClassifier {
    /// Build a classifier from configuration. Keywords are lower-cased here once.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let category_keywords = Category::SCORED
            .iter()
            .map(|&category| {
                (
                    category,
                    lowercase_all(config.categories.for_category(category)),
                )
            })
            .collect();

        Self {
            complex_keywords: lowercase_all(&config.complex_keywords),
            medium_keywords: lowercase_all(&config.medium_keywords),
            category_keywords,
            diacritics: config
                .secondary_diacritics
                .to_lowercase()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect(),
            short_prompt_chars: config.short_prompt_chars,
            medium_length_chars: config.medium_length_chars,
            complex_length_chars: config.complex_length_chars,
        }
    }

    /// Classify a request. Pure function of its inputs.
    pub fn classify(&self, text: &str, has_attachments: bool) -> Classification {
        let lower = text.to_lowercase();
        Classification {
            category: self.category(&lower),
            complexity: self.complexity(&lower, has_attachments),
            language: self.language(&lower),
            has_attachments,
        }
    }

    fn language(&self, lower: &str) -> Language {
        if lower.chars().any(|c| self.diacritics.contains(&c)) {
            Language::Secondary
        } else {
            Language::Primary
        }
    }

    fn complexity(&self, lower: &str, has_attachments: bool) -> Complexity {
        if has_attachments {
            return Complexity::Complex;
        }

        let complex_hit = contains_any(lower, &self.complex_keywords);
        let medium_hit = contains_any(lower, &self.medium_keywords);
        let chars = lower.chars().count();

        if !complex_hit && !medium_hit && chars < self.short_prompt_chars {
            return Complexity::Simple;
        }
        if complex_hit || chars > self.complex_length_chars {
            Complexity::Complex
        } else if medium_hit || chars > self.medium_length_chars {
            Complexity::Medium
        } else {
            Complexity::Simple
        }
    }

    fn category(&self, lower: &str) -> Category {
        let mut best = (Category::General, 0);
        for (category, score) in self.scores(lower) {
            // Strictly greater: ties keep the earlier category.
            if score > best.1 {
                best = (category, score);
            }
        }
        best.0
    }

    fn scores<'a>(&'a self, lower: &'a str) -> impl Iterator<Item = (Category, usize)> + 'a {
        self.category_keywords.iter().map(move |(category, keywords)| {
            let hits = keywords.iter().filter(|k| lower.contains(k.as_str())).count();
            (*category, hits)
        })
    }

    /// Keyword hit count per scored category, in tie-break order.
    pub fn category_scores(&self, text: &str) -> Vec<(Category, usize)> {
        let lower = text.to_lowercase();
        self.scores(&lower).collect()
    }

    /// Whether `text` contains any complexity keyword (complex or medium).
    pub fn has_complexity_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        contains_any(&lower, &self.complex_keywords) || contains_any(&lower, &self.medium_keywords)
    }
}

impl Default for PromptClassifier {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

fn contains_any(lower: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PromptClassifier {
        PromptClassifier::default()
    }

    #[test]
    fn short_vietnamese_poem_is_simple_creative() {
        let result = classifier().classify("viết một bài thơ về mùa thu", false);
        assert_eq!(result.category, Category::Creative);
        assert_eq!(result.language, Language::Secondary);
        assert_eq!(result.complexity, Complexity::Simple);
    }

    #[test]
    fn greeting_is_simple_general_primary() {
        let result = classifier().classify("hello there", false);
        assert_eq!(result.category, Category::General);
        assert_eq!(result.language, Language::Primary);
        assert_eq!(result.complexity, Complexity::Simple);
    }

    #[test]
    fn uppercase_diacritics_detected() {
        let result = classifier().classify("XIN CHÀO", false);
        assert_eq!(result.language, Language::Secondary);
    }

    #[test]
    fn attachments_force_complex() {
        let result = classifier().classify("hi", true);
        assert_eq!(result.complexity, Complexity::Complex);
        assert!(result.has_attachments);
    }

    #[test]
    fn complex_keyword_escalates() {
        let result = classifier().classify("please refactor my parser module", false);
        assert_eq!(result.complexity, Complexity::Complex);
        assert_eq!(result.category, Category::Coding);
    }

    #[test]
    fn medium_keyword_escalates() {
        let result = classifier().classify("explain how tides form on earth", false);
        assert_eq!(result.complexity, Complexity::Medium);
    }

    #[test]
    fn short_text_with_keyword_is_not_forced_simple() {
        // "why" is a medium keyword; the short-prompt override does not apply.
        let result = classifier().classify("why?", false);
        assert_eq!(result.complexity, Complexity::Medium);
    }

    #[test]
    fn length_alone_escalates() {
        let medium = "a".repeat(151);
        let complex = "a".repeat(501);
        assert_eq!(classifier().classify(&medium, false).complexity, Complexity::Medium);
        assert_eq!(classifier().classify(&complex, false).complexity, Complexity::Complex);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 100 two-byte characters: 200 bytes, but only 100 characters.
        let text = "đ".repeat(100);
        assert_eq!(classifier().classify(&text, false).complexity, Complexity::Simple);
    }

    #[test]
    fn highest_score_wins_over_order() {
        // One coding hit ("function") against two medical hits.
        let result = classifier().classify("function of a drug for this symptom", false);
        assert_eq!(result.category, Category::Medical);
    }

    #[test]
    fn ties_keep_first_evaluated_category() {
        // One coding hit ("python") and one creative hit ("poem").
        let result = classifier().classify("python poem", false);
        assert_eq!(result.category, Category::Coding);
    }

    #[test]
    fn math_keywords_classify_math() {
        let result = classifier().classify("solve this equation for x", false);
        assert_eq!(result.category, Category::Math);
    }

    #[test]
    fn translation_keywords_classify_translation() {
        let result = classifier().classify("translate to french: good morning", false);
        assert_eq!(result.category, Category::Translation);
    }

    #[test]
    fn category_scores_follow_tie_break_order() {
        let scores = classifier().category_scores("anything");
        let order: Vec<_> = scores.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, Category::SCORED.to_vec());
    }

    #[test]
    fn custom_keywords_are_lowercased() {
        let mut config = ClassifierConfig::default();
        config.categories.translation = vec!["TRADUIRE".to_string()];
        let classifier = PromptClassifier::from_config(&config);
        let result = classifier.classify("traduire ceci", false);
        assert_eq!(result.category, Category::Translation);
    }
}
