// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage ledger trait: append-only token and cost records per identity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::GateError;
use crate::traits::adapter::CollaboratorAdapter;
use crate::types::{UsageRecord, UsageSummary};

/// Append-only record of tokens and cost consumed, queryable by identity and window.
#[async_trait]
pub trait UsageLedger: CollaboratorAdapter {
    /// Sums message count and tokens for `identity`, optionally from `since` onward.
    async fn sum_usage(
        &self,
        identity: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<UsageSummary, GateError>;

    /// Appends one usage record for `identity`.
    async fn append(&self, identity: &str, record: UsageRecord) -> Result<(), GateError>;
}
