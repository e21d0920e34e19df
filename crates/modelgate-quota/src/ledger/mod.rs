// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage ledger implementations.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use modelgate_config::model::{LedgerBackend, LedgerConfig};
use modelgate_core::{GateError, UsageLedger};

pub use memory::InMemoryUsageLedger;
pub use sqlite::SqliteUsageLedger;

/// Open the ledger selected by `[ledger]`.
pub async fn open_ledger(config: &LedgerConfig) -> Result<Arc<dyn UsageLedger>, GateError> {
    match config.backend {
        LedgerBackend::Memory => Ok(Arc::new(InMemoryUsageLedger::new())),
        LedgerBackend::Sqlite => Ok(Arc::new(
            SqliteUsageLedger::open(&config.database_path).await?,
        )),
    }
}
