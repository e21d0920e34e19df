// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in routing tables: keyword lists, plan matrix, tier lists, affinity
//! tables, and the model catalog. Every table can be replaced from TOML.

use std::collections::BTreeMap;

use modelgate_core::{CapabilityVector, ModelDescriptor, Tier};

use crate::model::{AffinityTiers, PlanConfig};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

pub(crate) fn secondary_diacritics() -> String {
    "àáâãèéêìíòóôõùúýăđĩũơưạảấầẩẫậắằẳẵặẹẻẽếềểễệỉịọỏốồổỗộớờởỡợụủứừửữựỳỵỷỹ".to_string()
}

pub(crate) fn complex_keywords() -> Vec<String> {
    strings(&[
        "algorithm",
        "architecture",
        "benchmark",
        "build",
        "code",
        "compile",
        "comprehensive",
        "debug",
        "deep dive",
        "deploy",
        "design pattern",
        "detailed analysis",
        "differential diagnosis",
        "implement",
        "machine learning",
        "multi-step",
        "optimize",
        "refactor",
        "research",
        "step by step",
        "systematic",
        "chẩn đoán",
        "kiến trúc",
        "lập trình",
        "nghiên cứu",
        "phân tích chi tiết",
        "phương pháp",
        "thuật toán",
        "tối ưu hóa",
        "triển khai",
        "xây dựng",
    ])
}

// "write" and "viết" are creative signals, not depth signals: a short poem
// request stays simple.
pub(crate) fn medium_keywords() -> Vec<String> {
    strings(&[
        "analyze",
        "compare",
        "create",
        "describe",
        "draft",
        "explain",
        "how does",
        "list",
        "outline",
        "plan",
        "pros and cons",
        "review",
        "summarize",
        "why",
        "giải thích",
        "liệt kê",
        "mô tả",
        "phân tích",
        "so sánh",
        "tạo",
        "tóm tắt",
    ])
}

pub(crate) fn coding_keywords() -> Vec<String> {
    strings(&[
        "algorithm",
        "api",
        "bug",
        "class",
        "code",
        "component",
        "css",
        "database",
        "debug",
        "deploy",
        "docker",
        "error",
        "function",
        "git",
        "html",
        "implement",
        "javascript",
        "json",
        "node",
        "python",
        "react",
        "refactor",
        "regex",
        "rest",
        "sql",
        "test",
        "typescript",
        "variable",
        "lập trình",
        "lỗi",
        "mã nguồn",
        "thuật toán",
        "triển khai",
    ])
}

pub(crate) fn math_keywords() -> Vec<String> {
    strings(&[
        "calculate",
        "derivative",
        "equation",
        "integral",
        "math",
        "matrix",
        "probability",
        "proof",
        "solve",
        "theorem",
        "đạo hàm",
        "phương trình",
        "tích phân",
        "toán",
        "xác suất",
    ])
}

pub(crate) fn medical_keywords() -> Vec<String> {
    strings(&[
        "blood",
        "clinical",
        "diagnosis",
        "disease",
        "dosage",
        "drug",
        "health",
        "medical",
        "medicine",
        "patient",
        "prescription",
        "side effect",
        "symptom",
        "therapy",
        "treatment",
        "vaccine",
        "bệnh",
        "chẩn đoán",
        "dược",
        "liều",
        "sức khỏe",
        "thuốc",
        "triệu chứng",
        "điều trị",
    ])
}

pub(crate) fn analysis_keywords() -> Vec<String> {
    strings(&[
        "analyze",
        "benchmark",
        "chart",
        "compare",
        "data",
        "evaluate",
        "metrics",
        "report",
        "statistics",
        "trend",
        "dữ liệu",
        "đánh giá",
        "phân tích",
        "so sánh",
        "thống kê",
    ])
}

pub(crate) fn creative_keywords() -> Vec<String> {
    strings(&[
        "blog",
        "brainstorm",
        "creative",
        "essay",
        "fiction",
        "novel",
        "poem",
        "slogan",
        "story",
        "tagline",
        "tone",
        "bài viết",
        "sáng tác",
        "sáng tạo",
        "thơ",
        "truyện",
        "viết",
    ])
}

pub(crate) fn translation_keywords() -> Vec<String> {
    strings(&["dịch", "interpret", "localize", "translate", "translation"])
}

fn plan(tiers: &[Tier], paid: bool, default_model: &str) -> PlanConfig {
    PlanConfig {
        tiers: tiers.to_vec(),
        paid,
        default_model: Some(default_model.to_string()),
    }
}

pub(crate) fn plans() -> BTreeMap<String, PlanConfig> {
    use Tier::{Budget, Premium, Standard};

    let free = plan(&[Budget], false, "gemini-2.0-flash");
    let standard = plan(&[Budget, Standard], true, "gpt-4o-mini");
    let premium = plan(&[Budget, Standard, Premium], true, "gpt-4o");

    let mut table = BTreeMap::new();
    for code in ["free", "vn_free", "gl_starter"] {
        table.insert(code.to_string(), free.clone());
    }
    for code in [
        "vn_basic",
        "gl_standard",
        "gl_premium",
        "gl_lifetime",
        "medical_beta",
    ] {
        table.insert(code.to_string(), standard.clone());
    }
    for code in [
        "vn_pro",
        "vn_team",
        "vn_ultimate",
        "lifetime_early_bird",
        "lifetime_last_call",
        "lifetime_standard",
    ] {
        table.insert(code.to_string(), premium.clone());
    }
    table
}

pub(crate) fn tier1_models() -> Vec<String> {
    strings(&[
        "gpt-4o-mini",
        "gemini-2.0-flash",
        "gemini-1.5-flash",
        "claude-3-haiku",
        "deepseek-chat",
        "qwen-turbo",
        "llama-3.1-8b-instant",
        "llama-3.3-70b-versatile",
        "mercury-coder-small-2-2",
        "gemma-3-27b-it",
        "google/gemini-2.0-flash",
        "openai/gpt-4o-mini",
    ])
}

pub(crate) fn tier2_models() -> Vec<String> {
    strings(&[
        "gpt-4o",
        "gpt-4.1",
        "claude-3-5-sonnet",
        "claude-3-sonnet",
        "claude-sonnet-4-20250514",
        "gemini-1.5-pro",
        "gemini-2.5-pro",
        "gemini-2.5-flash",
        "deepseek-reasoner",
        "openai/gpt-4o",
        "google/gemini-2.5-pro",
        "google/gemini-2.5-flash",
        "anthropic/claude-sonnet-4-20250514",
    ])
}

pub(crate) fn tier3_models() -> Vec<String> {
    strings(&[
        "gpt-4-turbo",
        "claude-3-opus",
        "claude-opus-4-6",
        "o1",
        "o1-pro",
        "o3",
        "gemini-3-pro-preview",
        "gemini-3.1-pro-preview",
        "openai/o3-mini",
        "anthropic/claude-opus-4-6",
        "google/gemini-3.1-pro-preview",
    ])
}

fn affinity(tier1: &[&str], tier2: &[&str], tier3: &[&str]) -> AffinityTiers {
    AffinityTiers {
        tier1: strings(tier1),
        tier2: strings(tier2),
        tier3: strings(tier3),
    }
}

pub(crate) fn coding_affinity() -> AffinityTiers {
    affinity(
        &["google/gemini-2.0-flash", "mercury-coder-small-2-2", "gpt-4o-mini"],
        &[
            "anthropic/claude-sonnet-4-20250514",
            "openai/gpt-4o",
            "google/gemini-2.5-pro",
        ],
        &["anthropic/claude-opus-4-6", "google/gemini-3.1-pro-preview", "o1"],
    )
}

pub(crate) fn math_affinity() -> AffinityTiers {
    affinity(
        &["google/gemini-2.0-flash", "gpt-4o-mini"],
        &["google/gemini-2.5-pro", "openai/gpt-4o", "deepseek-reasoner"],
        &["o1", "google/gemini-3.1-pro-preview", "anthropic/claude-opus-4-6"],
    )
}

pub(crate) fn medical_affinity() -> AffinityTiers {
    affinity(
        &["google/gemini-2.0-flash", "gpt-4o-mini"],
        &["openai/gpt-4o", "google/gemini-2.5-pro"],
        &["google/gemini-3.1-pro-preview", "anthropic/claude-opus-4-6"],
    )
}

pub(crate) fn analysis_affinity() -> AffinityTiers {
    affinity(
        &["google/gemini-2.0-flash", "gemma-3-27b-it", "gpt-4o-mini"],
        &[
            "google/gemini-2.5-pro",
            "openai/gpt-4o",
            "anthropic/claude-sonnet-4-20250514",
        ],
        &["google/gemini-3.1-pro-preview", "anthropic/claude-opus-4-6"],
    )
}

pub(crate) fn creative_affinity() -> AffinityTiers {
    affinity(
        &["google/gemini-2.0-flash", "claude-3-haiku"],
        &["anthropic/claude-sonnet-4-20250514", "openai/gpt-4o"],
        &["anthropic/claude-opus-4-6", "claude-3-opus"],
    )
}

pub(crate) fn translation_affinity() -> AffinityTiers {
    affinity(
        &["google/gemini-2.0-flash", "gpt-4o-mini"],
        &["openai/gpt-4o", "google/gemini-2.5-flash"],
        &["google/gemini-3.1-pro-preview"],
    )
}

pub(crate) fn general_affinity() -> AffinityTiers {
    affinity(
        &["google/gemini-2.0-flash", "llama-3.3-70b-versatile", "gpt-4o-mini"],
        &["openai/gpt-4o", "google/gemini-2.5-flash"],
        &["google/gemini-3.1-pro-preview", "o1"],
    )
}

#[allow(clippy::too_many_arguments)]
fn descriptor(
    id: &str,
    provider_id: &str,
    tier: Tier,
    [analysis, coding, cost_efficiency, creativity, reasoning, speed]: [f64; 6],
    cost_per_input_unit: f64,
    cost_per_output_unit: f64,
    context_window: u32,
) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        provider_id: provider_id.to_string(),
        tier,
        capabilities: CapabilityVector {
            reasoning,
            creativity,
            coding,
            analysis,
            speed,
            cost_efficiency,
        },
        cost_per_input_unit,
        cost_per_output_unit,
        context_window,
    }
}

/// Capability vectors are `[analysis, coding, cost_efficiency, creativity, reasoning, speed]`.
/// Prices are USD per 1,000 tokens.
pub(crate) fn catalog() -> Vec<ModelDescriptor> {
    use Tier::{Budget, Premium, Standard};

    vec![
        descriptor(
            "gemini-1.5-flash",
            "google",
            Budget,
            [7.0, 6.0, 10.0, 7.0, 6.0, 10.0],
            0.000_075,
            0.000_3,
            1_000_000,
        ),
        descriptor(
            "gemini-2.0-flash",
            "google",
            Budget,
            [7.0, 7.0, 10.0, 7.0, 7.0, 10.0],
            0.000_1,
            0.000_4,
            1_000_000,
        ),
        descriptor(
            "gpt-4o-mini",
            "openai",
            Budget,
            [7.0, 8.0, 9.0, 7.0, 7.0, 9.0],
            0.000_15,
            0.000_6,
            128_000,
        ),
        descriptor(
            "claude-3-haiku",
            "anthropic",
            Budget,
            [6.0, 6.0, 8.0, 8.0, 6.0, 8.0],
            0.000_25,
            0.001_25,
            200_000,
        ),
        descriptor(
            "gemini-1.5-pro",
            "google",
            Standard,
            [9.0, 8.0, 6.0, 8.0, 8.0, 7.0],
            0.001_25,
            0.005,
            2_000_000,
        ),
        descriptor(
            "gpt-4o",
            "openai",
            Standard,
            [8.0, 9.0, 5.0, 8.0, 9.0, 6.0],
            0.002_5,
            0.01,
            128_000,
        ),
        descriptor(
            "claude-3-sonnet",
            "anthropic",
            Standard,
            [9.0, 8.0, 4.0, 9.0, 9.0, 5.0],
            0.003,
            0.015,
            200_000,
        ),
        descriptor(
            "claude-3-opus",
            "anthropic",
            Premium,
            [10.0, 9.0, 2.0, 10.0, 10.0, 3.0],
            0.015,
            0.075,
            200_000,
        ),
        descriptor(
            "o1",
            "openai",
            Premium,
            [9.0, 9.0, 2.0, 6.0, 10.0, 3.0],
            0.015,
            0.06,
            200_000,
        ),
    ]
}
