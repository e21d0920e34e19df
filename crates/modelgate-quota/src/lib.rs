// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trial quota tracking and usage ledgers.
//!
//! [`QuotaTracker`] enforces trial message and token ceilings against a
//! [`UsageLedger`](modelgate_core::UsageLedger), and restricts trial
//! identities to an allow-list of inexpensive models. Two ledgers ship
//! with the crate: an in-memory one and a SQLite one.

pub mod ledger;
pub mod tracker;

pub use ledger::{InMemoryUsageLedger, SqliteUsageLedger, open_ledger};
pub use tracker::{ModelValidation, QuotaCheck, QuotaTracker};
