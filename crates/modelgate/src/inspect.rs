// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `modelgate classify`, `route` and `check` command implementations.

use modelgate_config::ModelgateConfig;
use modelgate_core::{GateError, QueryHistory, StrategyKind, UserContext};
use modelgate_ratelimit::{LimiterProfile, RateLimiter};
use modelgate_router::{AvailableModel, ModelRouter, PromptClassifier, RouteRequest};
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> Result<(), GateError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| GateError::Internal(format!("failed to serialize output: {e}")))?;
    println!("{rendered}");
    Ok(())
}

pub fn run_classify(
    config: &ModelgateConfig,
    text: &str,
    attachments: bool,
    json: bool,
) -> Result<(), GateError> {
    let classification = PromptClassifier::from_config(&config.classifier).classify(text, attachments);
    if json {
        return print_json(&classification);
    }
    println!("category:   {}", classification.category);
    println!("complexity: {}", classification.complexity);
    println!("language:   {}", classification.language);
    Ok(())
}

pub struct RouteArgs<'a> {
    pub text: &'a str,
    pub plan: &'a str,
    pub budget: f64,
    pub strategy: Option<StrategyKind>,
    pub available: &'a [String],
    pub attachments: bool,
}

#[derive(Serialize)]
struct RouteOutput<'a> {
    classification: &'a modelgate_core::Classification,
    tiers: Vec<u8>,
    decision: &'a modelgate_core::RoutingDecision,
}

pub fn run_route(config: &ModelgateConfig, args: RouteArgs<'_>, json: bool) -> Result<(), GateError> {
    if !args.budget.is_finite() || args.budget < 0.0 {
        return Err(GateError::Config(format!(
            "budget must be a non-negative number, got {}",
            args.budget
        )));
    }

    let router = ModelRouter::new(config);
    let user = UserContext::new(
        "cli",
        args.plan,
        args.budget,
        Vec::new(),
        QueryHistory::with_capacity(config.gateway.history_capacity),
    );
    let tables = router.tables();
    let available: Vec<AvailableModel> = args
        .available
        .iter()
        .map(|id| {
            let provider = tables
                .catalog()
                .get(id)
                .map(|m| m.provider_id.clone())
                .unwrap_or_else(|| "unknown".to_string());
            AvailableModel::new(id.clone(), provider)
        })
        .collect();

    let mut request = RouteRequest::new(args.text, &user);
    request.has_attachments = args.attachments;
    request.strategy = args.strategy;
    if !available.is_empty() {
        request.available = Some(&available);
    }
    let outcome = router.route(&request);

    if json {
        return print_json(&RouteOutput {
            classification: &outcome.classification,
            tiers: outcome.tiers.levels(),
            decision: &outcome.decision,
        });
    }

    let decision = &outcome.decision;
    println!(
        "classification: {} / {} / {}",
        outcome.classification.category,
        outcome.classification.complexity,
        outcome.classification.language
    );
    println!("tiers:          {:?}", outcome.tiers.levels());
    println!("model:          {} ({})", decision.selected_model_id, decision.provider_id);
    println!("tier:           {}", decision.tier);
    println!("strategy:       {}", decision.strategy);
    println!("confidence:     {:.2}", decision.confidence);
    if let Some(cost) = decision.estimated_cost {
        println!("estimated cost: ${cost:.6}");
    }
    if !decision.alternative_model_ids.is_empty() {
        println!("alternatives:   {}", decision.alternative_model_ids.join(", "));
    }
    println!("reason:         {}", decision.reason);
    Ok(())
}

#[derive(Serialize)]
struct CheckOutput {
    request: u32,
    outcome: modelgate_ratelimit::RateLimitOutcome,
}

pub fn run_check(
    config: &ModelgateConfig,
    address: &str,
    identity: &str,
    profile: LimiterProfile,
    count: u32,
    json: bool,
) -> Result<(), GateError> {
    let limiter = RateLimiter::from_profile(&config.rate_limit, profile);
    let outcomes: Vec<CheckOutput> = (1..=count)
        .map(|request| CheckOutput {
            request,
            outcome: limiter.check(address, identity),
        })
        .collect();

    if json {
        return print_json(&outcomes);
    }

    for CheckOutput { request, outcome } in &outcomes {
        if outcome.allowed {
            println!("#{request}: allowed, {} remaining", outcome.remaining);
        } else {
            println!(
                "#{request}: denied, {}",
                outcome.reason.as_deref().unwrap_or("rate limit exceeded")
            );
        }
    }
    if let Some(last) = outcomes.last() {
        for (name, value) in last.outcome.headers() {
            println!("{name}: {value}");
        }
    }
    Ok(())
}
