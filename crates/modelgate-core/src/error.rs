// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the modelgate request router.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across modelgate services and collaborator traits.
#[derive(Debug, Error)]
pub enum GateError {
    /// Configuration errors (invalid TOML, out-of-range values, inconsistent tables).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An external collaborator (entitlement source, usage ledger) failed or was unreachable.
    #[error("collaborator unavailable: {collaborator}: {message}")]
    CollaboratorUnavailable {
        collaborator: String,
        message: String,
    },

    /// The request was rejected by the rate limiter.
    #[error("rate limited: {reason} (retry after {retry_after:?})")]
    RateLimited {
        reason: String,
        retry_after: Duration,
    },

    /// The identity has exhausted its trial quota.
    #[error("quota exhausted: {reason}")]
    QuotaExhausted { reason: String },

    /// No candidate fits the remaining budget. Recovered inside the selector.
    #[error("estimated cost {estimated_cost:.6} exceeds remaining budget {remaining_budget:.6}")]
    BudgetExceeded {
        estimated_cost: f64,
        remaining_budget: f64,
    },

    /// Neither the catalog nor the available set yielded a candidate.
    #[error("no candidate model available")]
    NoCandidateAvailable,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Whether this error should be surfaced to the caller rather than degraded.
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            GateError::RateLimited { .. } | GateError::QuotaExhausted { .. }
        )
    }

    /// Seconds until the caller may retry, for rate-limit denials.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            GateError::RateLimited { retry_after, .. } => {
                Some(retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surfaced_errors() {
        let limited = GateError::RateLimited {
            reason: "address rate limit exceeded".into(),
            retry_after: Duration::from_secs(12),
        };
        let quota = GateError::QuotaExhausted {
            reason: "out of messages".into(),
        };
        assert!(limited.is_surfaced());
        assert!(quota.is_surfaced());
        assert!(!GateError::NoCandidateAvailable.is_surfaced());
        assert!(
            !GateError::CollaboratorUnavailable {
                collaborator: "entitlement".into(),
                message: "timeout".into(),
            }
            .is_surfaced()
        );
    }

    #[test]
    fn retry_after_rounds_up() {
        let err = GateError::RateLimited {
            reason: "identity rate limit exceeded".into(),
            retry_after: Duration::from_millis(1_500),
        };
        assert_eq!(err.retry_after_secs(), Some(2));
        assert_eq!(GateError::Internal("x".into()).retry_after_secs(), None);
    }

    #[test]
    fn display_includes_reason() {
        let err = GateError::RateLimited {
            reason: "address rate limit exceeded: 30 requests per 60s".into(),
            retry_after: Duration::from_secs(3),
        };
        assert!(err.to_string().contains("rate limit exceeded"));
    }
}
