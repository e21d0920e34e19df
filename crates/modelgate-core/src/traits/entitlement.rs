// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entitlement source trait: plan code and remaining budget per identity.

use async_trait::async_trait;

use crate::error::GateError;
use crate::traits::adapter::CollaboratorAdapter;
use crate::types::PlanSnapshot;

/// Supplies the current plan and wallet balance for an identity.
///
/// Entitlement can change between requests, so callers must not cache
/// the snapshot beyond a single request.
#[async_trait]
pub trait EntitlementSource: CollaboratorAdapter {
    /// Looks up the plan snapshot for `identity`.
    async fn get_plan(&self, identity: &str) -> Result<PlanSnapshot, GateError>;
}
