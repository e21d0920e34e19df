// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local usage ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use modelgate_core::{
    AdapterType, CollaboratorAdapter, GateError, HealthStatus, UsageLedger, UsageRecord,
    UsageSummary,
};

/// Append-only per-identity record lists. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryUsageLedger {
    records: DashMap<String, Vec<UsageRecord>>,
}

impl InMemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities with at least one record.
    pub fn identities(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl CollaboratorAdapter for InMemoryUsageLedger {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::UsageLedger
    }

    async fn health_check(&self) -> Result<HealthStatus, GateError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl UsageLedger for InMemoryUsageLedger {
    async fn sum_usage(
        &self,
        identity: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<UsageSummary, GateError> {
        let Some(records) = self.records.get(identity) else {
            return Ok(UsageSummary::default());
        };
        Ok(records
            .iter()
            .filter(|r| since.is_none_or(|s| r.created_at >= s))
            .fold(UsageSummary::default(), |mut acc, r| {
                acc.message_count += 1;
                acc.total_tokens = acc.total_tokens.saturating_add(r.tokens);
                acc
            }))
    }

    async fn append(&self, identity: &str, record: UsageRecord) -> Result<(), GateError> {
        self.records
            .entry(identity.to_string())
            .or_default()
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn sums_per_identity() {
        let ledger = InMemoryUsageLedger::new();
        ledger.append("alice", UsageRecord::new("m", 100, 0.01)).await.unwrap();
        ledger.append("alice", UsageRecord::new("m", 50, 0.01)).await.unwrap();
        ledger.append("bob", UsageRecord::new("m", 7, 0.01)).await.unwrap();

        let alice = ledger.sum_usage("alice", None).await.unwrap();
        assert_eq!(alice, UsageSummary { message_count: 2, total_tokens: 150 });
        assert_eq!(ledger.sum_usage("carol", None).await.unwrap(), UsageSummary::default());
        assert_eq!(ledger.identities(), 2);
    }

    #[tokio::test]
    async fn since_bound_excludes_older_records() {
        let ledger = InMemoryUsageLedger::new();
        let mut old = UsageRecord::new("m", 1000, 0.0);
        old.created_at = Utc::now() - Duration::days(40);
        ledger.append("alice", old).await.unwrap();
        ledger.append("alice", UsageRecord::new("m", 10, 0.0)).await.unwrap();

        let since = Utc::now() - Duration::days(30);
        let summary = ledger.sum_usage("alice", Some(since)).await.unwrap();
        assert_eq!(summary, UsageSummary { message_count: 1, total_tokens: 10 });
    }
}
