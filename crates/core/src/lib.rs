// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rl-core: shared types for the reclog record log
//!
//! This crate provides:
//! - The `Record` type exchanged between the log, the daemon and the CLI
//! - Configuration loading (TOML file + environment overrides)

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod record;

pub use config::{Config, ConfigError};
pub use record::Record;
