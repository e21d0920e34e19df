// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! All collaborators extend the [`CollaboratorAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod entitlement;
pub mod ledger;

pub use adapter::CollaboratorAdapter;
pub use entitlement::EntitlementSource;
pub use ledger::UsageLedger;
