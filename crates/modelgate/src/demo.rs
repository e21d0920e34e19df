// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `modelgate serve-demo` command implementation.
//!
//! Builds the full gateway with a fixed-plan entitlement source and the
//! configured usage ledger, then routes one prompt per stdin line until
//! EOF or Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use modelgate_config::ModelgateConfig;
use modelgate_core::{
    AdapterType, CollaboratorAdapter, EntitlementSource, GateError, HealthStatus, PlanSnapshot,
};
use modelgate_gateway::{ChatRequest, ConfigWatcher, GatewayDecision, RequestGateway};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Address reported for stdin callers.
const LOCAL_ADDRESS: &str = "127.0.0.1";

/// Entitlement source that gives every identity the same plan.
pub struct StaticEntitlementSource {
    plan: PlanSnapshot,
}

impl StaticEntitlementSource {
    pub fn new(plan_code: &str, remaining_budget: f64) -> Self {
        Self {
            plan: PlanSnapshot {
                plan_code: plan_code.to_string(),
                remaining_budget,
                preferred_model_ids: Vec::new(),
            },
        }
    }
}

#[async_trait]
impl CollaboratorAdapter for StaticEntitlementSource {
    fn name(&self) -> &str {
        "static"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Entitlement
    }

    async fn health_check(&self) -> Result<HealthStatus, GateError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EntitlementSource for StaticEntitlementSource {
    async fn get_plan(&self, _identity: &str) -> Result<PlanSnapshot, GateError> {
        Ok(self.plan.clone())
    }
}

/// Split `<identity> <text>`. Lines without text are skipped.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (identity, text) = line.trim().split_once(char::is_whitespace)?;
    let text = text.trim();
    (!text.is_empty()).then_some((identity, text))
}

/// Cancel the returned token on Ctrl+C.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, initiating shutdown");
        }
        cancel.cancel();
    });
    token
}

fn print_decision(identity: &str, decision: &GatewayDecision) {
    let d = &decision.decision;
    println!(
        "{identity}: {} [tier {}, {}, confidence {:.2}] {}",
        d.selected_model_id, d.tier, d.strategy, d.confidence, d.reason
    );
    if let Some(remaining) = decision.quota.messages_remaining() {
        println!("  trial messages remaining: {remaining}");
    }
    if !decision.degraded.is_empty() {
        println!("  degraded: {}", decision.degraded.join(", "));
    }
}

pub async fn run_serve_demo(
    config: ModelgateConfig,
    plan_code: &str,
    budget: f64,
    watch_path: Option<PathBuf>,
) -> Result<(), GateError> {
    let metrics = if config.metrics.enabled {
        Some(modelgate_gateway::install_prometheus()?)
    } else {
        None
    };

    let ledger = modelgate_quota::open_ledger(&config.ledger).await?;
    let entitlement = Arc::new(StaticEntitlementSource::new(plan_code, budget));
    let gateway = Arc::new(RequestGateway::new(&config, entitlement, ledger));

    let cancel = install_signal_handler();
    let sweepers = gateway.spawn_sweepers(cancel.clone());
    let watcher = match watch_path {
        Some(path) => Some(ConfigWatcher::spawn(path, gateway.clone(), cancel.clone())?),
        None => None,
    };

    info!(plan = plan_code, budget, "serve-demo ready, reading prompts from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = cancel.cancelled() => break,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                break;
            }
        };
        let Some((identity, text)) = parse_line(&line) else {
            debug!("skipping line without prompt text");
            continue;
        };

        match gateway
            .handle(ChatRequest::new(identity, LOCAL_ADDRESS, text))
            .await
        {
            Ok(decision) => {
                print_decision(identity, &decision);
                let tokens = u64::from(decision.decision.estimated_tokens.unwrap_or_default());
                let cost = decision.decision.estimated_cost.unwrap_or_default();
                if let Err(e) = gateway
                    .record_usage(
                        identity,
                        &decision.plan.plan_code,
                        &decision.decision.selected_model_id,
                        tokens,
                        cost,
                    )
                    .await
                {
                    warn!(identity, error = %e, "failed to record usage");
                }
            }
            Err(e) if e.is_surfaced() => println!("{identity}: denied: {e}"),
            Err(e) => return Err(e),
        }
    }

    cancel.cancel();
    for sweeper in sweepers {
        let _ = sweeper.await;
    }
    if let Some(watcher) = watcher {
        watcher.stopped().await;
    }
    if let Some(handle) = metrics {
        print!("{}", handle.render());
    }
    info!("serve-demo stopped");
    Ok(())
}
