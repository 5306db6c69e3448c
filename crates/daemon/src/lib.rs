// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rl-daemon: serves a record log over TCP
//!
//! The `rld` binary wraps [`lifecycle::startup`] and [`lifecycle::DaemonState::run`].
//! The wire types in [`protocol`] are shared with the `rl` client.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use lifecycle::{startup, DaemonState, LifecycleError, STARTUP_MARKER_PREFIX};
pub use protocol::{ProtocolError, Request, Response, PROTOCOL_VERSION};
pub use server::Service;
