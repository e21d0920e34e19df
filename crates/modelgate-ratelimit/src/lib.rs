// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admission control for modelgate.
//!
//! [`RateLimiter`] keeps independent per-address and per-identity request
//! counters over fixed windows. A background sweeper evicts expired entries;
//! the clock is injectable so window behaviour is testable without sleeping.

pub mod clock;
pub mod limiter;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{
    LimitScope, LimiterProfile, RateLimitOutcome, RateLimitStats, RateLimiter, client_address,
};
pub use sweeper::spawn_sweeper;
