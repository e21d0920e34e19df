// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration hot-reload.
//!
//! Watches the directory holding the config file, so editors that save by
//! renaming a temp file over the original are picked up. Each debounced
//! change is loaded and validated; an invalid file is logged and the
//! running configuration stays in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use modelgate_config::ModelgateConfig;
use modelgate_core::GateError;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::gateway::RequestGateway;

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Running config watcher. Dropping it stops file notifications.
pub struct ConfigWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    task: JoinHandle<()>,
}

impl ConfigWatcher {
    /// Watch `path` and apply valid changes to `gateway`.
    pub fn spawn(
        path: PathBuf,
        gateway: Arc<RequestGateway>,
        cancel: CancellationToken,
    ) -> Result<Self, GateError> {
        Self::spawn_with(path, DEFAULT_DEBOUNCE, cancel, move |config| {
            gateway.reload(config);
        })
    }

    /// Watch `path` and hand every valid reload to `on_reload`.
    pub fn spawn_with<F>(
        path: PathBuf,
        debounce: Duration,
        cancel: CancellationToken,
        on_reload: F,
    ) -> Result<Self, GateError>
    where
        F: Fn(&ModelgateConfig) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = new_debouncer(debounce, move |res: DebounceEventResult| {
            let _ = tx.send(res);
        })
        .map_err(|e| GateError::Internal(format!("failed to create config watcher: {e}")))?;

        let watch_dir = watch_dir(&path);
        debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                GateError::Internal(format!("failed to watch {}: {e}", watch_dir.display()))
            })?;
        info!(path = %path.display(), "watching config file");

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    res = rx.recv() => {
                        let Some(res) = res else { break };
                        match res {
                            Ok(events) => {
                                let ours = events
                                    .iter()
                                    .any(|e| e.path.file_name() == path.file_name());
                                if ours {
                                    apply_reload(&path, &on_reload);
                                }
                            }
                            Err(e) => warn!(error = %e, "config watcher error"),
                        }
                    }
                    _ = cancel.cancelled() => {
                        info!("config watcher shutting down");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            _debouncer: debouncer,
            task,
        })
    }

    /// Wait for the watcher task to finish after cancellation.
    pub async fn stopped(self) {
        let _ = self.task.await;
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn apply_reload<F>(path: &Path, on_reload: &F)
where
    F: Fn(&ModelgateConfig),
{
    match modelgate_config::load_and_validate_path(path) {
        Ok(config) => {
            on_reload(&config);
            info!(path = %path.display(), "config reloaded");
        }
        Err(errors) => {
            let details = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            warn!(
                path = %path.display(),
                errors = errors.len(),
                details = %details,
                "config reload rejected, keeping current config"
            );
        }
    }
    debug!(path = %path.display(), "config change handled");
}
