// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the modelgate request router.
//!
//! This crate provides the error type, the value types passed between the
//! classifier, selector, rate limiter and quota tracker, and the traits the
//! surrounding system implements to supply entitlements and usage data.

pub mod error;
pub mod traits;
pub mod types;

pub use error::GateError;
pub use types::{
    AdapterType, CapabilityVector, Category, Classification, Complexity, FallbackKind,
    HealthStatus, Language, ModelDescriptor, PlanSnapshot, QueryHistory, QuotaState,
    RoutingDecision, StrategyKind, Tier, TierSet, UsageRecord, UsageSummary, UserContext,
};

pub use traits::{CollaboratorAdapter, EntitlementSource, UsageLedger};
