// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock usage ledger.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use modelgate_core::{
    AdapterType, CollaboratorAdapter, GateError, HealthStatus, UsageLedger, UsageRecord,
    UsageSummary,
};

/// In-memory ledger with failure injection and read counting.
pub struct MockUsageLedger {
    records: DashMap<String, Vec<UsageRecord>>,
    failing: AtomicBool,
    reads: AtomicUsize,
    append_delay: Option<Duration>,
}

impl MockUsageLedger {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            failing: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            append_delay: None,
        }
    }

    /// Seed `count` prior messages of `tokens_each` tokens for `identity`.
    pub fn with_messages(self, identity: &str, count: usize, tokens_each: u64) -> Self {
        let mut entry = self.records.entry(identity.to_string()).or_default();
        for _ in 0..count {
            entry.push(UsageRecord::new("gemini-2.0-flash", tokens_each, 0.0));
        }
        drop(entry);
        self
    }

    /// Hold every append for `delay` before it lands.
    pub fn with_append_delay(mut self, delay: Duration) -> Self {
        self.append_delay = Some(delay);
        self
    }

    /// Toggle failure injection for reads and writes.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `sum_usage` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Records appended for `identity`.
    pub fn records(&self, identity: &str) -> Vec<UsageRecord> {
        self.records
            .get(identity)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn check_failure(&self) -> Result<(), GateError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GateError::CollaboratorUnavailable {
                collaborator: "usage_ledger".to_string(),
                message: "failure injected".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MockUsageLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CollaboratorAdapter for MockUsageLedger {
    fn name(&self) -> &str {
        "mock-ledger"
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
impl UsageLedger for MockUsageLedger {
    async fn sum_usage(
        &self,
        identity: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<UsageSummary, GateError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let mut summary = UsageSummary::default();
        if let Some(records) = self.records.get(identity) {
            for record in records.iter().filter(|r| since.is_none_or(|s| r.created_at >= s)) {
                summary.message_count += 1;
                summary.total_tokens += record.tokens;
            }
        }
        Ok(summary)
    }

    async fn append(&self, identity: &str, record: UsageRecord) -> Result<(), GateError> {
        if let Some(delay) = self.append_delay {
            tokio::time::sleep(delay).await;
        }
        self.check_failure()?;
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

    #[tokio::test]
    async fn seeded_messages_are_summed() {
        let ledger = MockUsageLedger::new().with_messages("alice", 3, 100);
        let summary = ledger.sum_usage("alice", None).await.unwrap();
        assert_eq!(summary, UsageSummary { message_count: 3, total_tokens: 300 });
        assert_eq!(ledger.reads(), 1);
    }

    #[tokio::test]
    async fn failing_ledger_errors() {
        let ledger = MockUsageLedger::new();
        ledger.fail(true);
        assert!(ledger.sum_usage("alice", None).await.is_err());
        assert!(ledger
            .append("alice", UsageRecord::new("m", 1, 0.0))
            .await
            .is_err());
    }
}
