// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed usage ledger.
//!
//! Records land in the `usage_ledger` table, created on open. All
//! operations go through the single tokio-rusqlite background thread.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modelgate_core::{
    AdapterType, CollaboratorAdapter, GateError, HealthStatus, UsageLedger, UsageRecord,
    UsageSummary,
};
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS usage_ledger (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        identity TEXT NOT NULL,
        model_id TEXT NOT NULL,
        tokens INTEGER NOT NULL DEFAULT 0,
        cost_usd REAL NOT NULL DEFAULT 0.0,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_usage_ledger_identity
        ON usage_ledger(identity, created_at);";

/// Timestamps are stored in a fixed-width UTC format so text comparison
/// orders them chronologically.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Convert a tokio-rusqlite error into GateError::Storage.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> GateError {
    GateError::Storage {
        source: Box::new(e),
    }
}

pub struct SqliteUsageLedger {
    conn: tokio_rusqlite::Connection,
}

impl SqliteUsageLedger {
    /// Wrap an existing connection, creating the schema if needed.
    pub async fn new(conn: tokio_rusqlite::Connection) -> Result<Self, GateError> {
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Open a ledger at `path` in WAL mode.
    pub async fn open(path: &str) -> Result<Self, GateError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| GateError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            conn.busy_timeout(Duration::from_secs(5))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
        debug!(path, "usage ledger opened");
        Self::new(conn).await
    }

    pub async fn open_in_memory() -> Result<Self, GateError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| GateError::Storage {
                source: Box::new(e),
            })?;
        Self::new(conn).await
    }
}

#[async_trait]
impl CollaboratorAdapter for SqliteUsageLedger {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::UsageLedger
    }

    async fn health_check(&self) -> Result<HealthStatus, GateError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl UsageLedger for SqliteUsageLedger {
    async fn sum_usage(
        &self,
        identity: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<UsageSummary, GateError> {
        let identity = identity.to_string();
        let since = since.map(format_timestamp);
        let (count, tokens) = self
            .conn
            .call(move |conn| -> Result<(i64, i64), rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(tokens), 0) FROM usage_ledger \
                     WHERE identity = ?1 AND (?2 IS NULL OR created_at >= ?2)",
                    rusqlite::params![identity, since],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
            })
            .await
            .map_err(map_tr_err)?;

        Ok(UsageSummary {
            message_count: u64::try_from(count).unwrap_or_default(),
            total_tokens: u64::try_from(tokens).unwrap_or_default(),
        })
    }

    async fn append(&self, identity: &str, record: UsageRecord) -> Result<(), GateError> {
        let identity = identity.to_string();
        let tokens = i64::try_from(record.tokens).unwrap_or(i64::MAX);
        let created_at = format_timestamp(record.created_at);

        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO usage_ledger (identity, model_id, tokens, cost_usd, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![identity, record.model_id, tokens, record.cost_usd, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
