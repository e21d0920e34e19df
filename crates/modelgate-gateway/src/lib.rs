// SPDX-FileCopyrightText: 2026 Modelgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request gateway for modelgate.
//!
//! [`RequestGateway`] runs one chat request through admission control,
//! entitlement lookup, trial quota, routing and trial model adjustment.
//! Collaborator failures degrade to the lowest tier and zero budget; rate
//! limit and quota denials are surfaced as errors.

pub mod gateway;
pub mod recording;
pub mod watcher;

pub use gateway::{ChatRequest, GatewayDecision, RequestGateway};
pub use recording::{install_prometheus, register_metrics};
pub use watcher::ConfigWatcher;
