// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock entitlement source.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use modelgate_core::{
    AdapterType, CollaboratorAdapter, EntitlementSource, GateError, HealthStatus, PlanSnapshot,
};

/// Entitlement source backed by a map of identity to plan.
///
/// Unknown identities get the `free` plan with a zero budget. Call
/// [`fail`](Self::fail) to make every lookup return
/// [`GateError::CollaboratorUnavailable`].
pub struct MockEntitlementSource {
    plans: DashMap<String, PlanSnapshot>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockEntitlementSource {
    pub fn new() -> Self {
        Self {
            plans: DashMap::new(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Builder-style plan assignment.
    pub fn with_plan(self, identity: &str, plan_code: &str, remaining_budget: f64) -> Self {
        self.set_plan(identity, plan_code, remaining_budget);
        self
    }

    pub fn set_plan(&self, identity: &str, plan_code: &str, remaining_budget: f64) {
        self.plans.insert(
            identity.to_string(),
            PlanSnapshot {
                plan_code: plan_code.to_string(),
                remaining_budget,
                preferred_model_ids: Vec::new(),
            },
        );
    }

    /// Toggle failure injection.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `get_plan` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockEntitlementSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CollaboratorAdapter for MockEntitlementSource {
    fn name(&self) -> &str {
        "mock-entitlement"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Entitlement
    }

    async fn health_check(&self) -> Result<HealthStatus, GateError> {
        if self.failing.load(Ordering::SeqCst) {
            Ok(HealthStatus::Unhealthy("failure injected".to_string()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }
}

#[async_trait]
impl EntitlementSource for MockEntitlementSource {
    async fn get_plan(&self, identity: &str) -> Result<PlanSnapshot, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(GateError::CollaboratorUnavailable {
                collaborator: "entitlement".to_string(),
                message: "failure injected".to_string(),
            });
        }
        Ok(self
            .plans
            .get(identity)
            .map(|p| p.clone())
            .unwrap_or_else(|| PlanSnapshot {
                plan_code: "free".to_string(),
                remaining_budget: 0.0,
                preferred_model_ids: Vec::new(),
            }))
    }
}
