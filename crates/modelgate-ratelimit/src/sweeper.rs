// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background eviction of expired rate-limit entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::limiter::RateLimiter;

/// Sweep `limiter` every `every` until `cancel` fires.
///
/// `on_sweep` runs after each pass with the post-sweep limiter, so callers
/// can publish gauges without this crate depending on a metrics backend.
pub fn spawn_sweeper<F>(
    limiter: Arc<RateLimiter>,
    every: Duration,
    cancel: CancellationToken,
    on_sweep: F,
) -> JoinHandle<()>
where
    F: Fn(&RateLimiter) + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = limiter.sweep();
                    debug!(removed, "rate limit sweep complete");
                    on_sweep(&limiter);
                }
                _ = cancel.cancelled() => {
                    info!("rate limit sweeper shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::DateTime;
    use modelgate_config::model::RateLimitProfile;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_and_stops_on_cancel() {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let profile = RateLimitProfile {
            address_limit: 10,
            address_window_secs: 60,
            identity_limit: 10,
            identity_window_secs: 60,
        };
        let limiter = Arc::new(RateLimiter::with_clock(profile, clock.clone()));
        limiter.check("10.0.0.1", "alice");
        clock.advance(Duration::from_secs(120));

        let passes = Arc::new(AtomicUsize::new(0));
        let counter = passes.clone();
        let cancel = CancellationToken::new();
        let handle = spawn_sweeper(
            limiter.clone(),
            Duration::from_secs(300),
            cancel.clone(),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(passes.load(Ordering::SeqCst), 1);
        assert_eq!(limiter.entry_counts().address_entries, 0);
        assert_eq!(limiter.entry_counts().identity_entries, 0);

        cancel.cancel();
        handle.await.unwrap();
    }
}
