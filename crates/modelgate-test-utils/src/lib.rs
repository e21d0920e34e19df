// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for modelgate integration tests.
//!
//! Provides mock collaborators and fixtures for fast, deterministic tests
//! without external services.
//!
//! # Components
//!
//! - [`MockEntitlementSource`] - Per-identity plan snapshots with failure injection
//! - [`MockUsageLedger`] - In-memory usage ledger with failure injection
//! - [`fixtures`] - Prompts, users and configurations used across crates

pub mod fixtures;
pub mod mock_entitlement;
pub mod mock_ledger;

pub use mock_entitlement::MockEntitlementSource;
pub use mock_ledger::MockUsageLedger;
