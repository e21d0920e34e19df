// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by every external collaborator.

use async_trait::async_trait;

use crate::error::GateError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for modelgate collaborators.
///
/// Entitlement sources and usage ledgers are owned by the surrounding
/// system; this trait gives them an identity and a health check so the
/// gateway can report on them uniformly.
#[async_trait]
pub trait CollaboratorAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this collaborator instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this collaborator.
    fn version(&self) -> semver::Version;

    /// Returns the kind of collaborator.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the collaborator's current status.
    async fn health_check(&self) -> Result<HealthStatus, GateError>;
}
