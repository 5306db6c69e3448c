// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.
//!
//! This module provides enhanced error types that include:
//! - What went wrong (message)
//! - Why it might have happened (context)
//! - How to fix it (suggestions)

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

use crate::client::ClientError;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct RlError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RlError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Add context about why this error might have happened.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    /// Add a suggestion for how to fix this error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Set the source error that caused this error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for RlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for RlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Common error builders for typical failure scenarios.
impl RlError {
    /// Error for when nothing answers at the daemon address.
    pub fn daemon_not_running(addr: SocketAddr) -> Self {
        RlError::new(format!("No daemon listening at {}", addr))
            .with_context("rld may not be started, or listens on another address")
            .with_suggestion("Start the daemon: rl daemon start")
            .with_suggestion("Point at a running daemon: rl --addr HOST:PORT ...")
    }

    /// Error for when the daemon process failed to come up.
    pub fn daemon_start_failed(reason: &str, log_path: &Path) -> Self {
        RlError::new("Failed to start daemon")
            .with_context(reason.to_string())
            .with_suggestion(format!("Check the daemon log: {}", log_path.display()))
            .with_suggestion("Set RL_DAEMON_BINARY if rld is not next to rl or on PATH")
    }

    /// Error for when a consume targets an offset past the end of the log.
    pub fn offset_not_found(offset: u64) -> Self {
        RlError::new(format!("Offset {} not found", offset))
            .with_context("Offsets are assigned densely from 0; this one has not been produced")
            .with_suggestion("Check how many records exist: rl status")
    }

    /// Error for when a file cannot be walked as a record log.
    pub fn unreadable_log(path: &Path) -> Self {
        RlError::new(format!("Cannot read record log {}", path.display()))
            .with_context("The file may not exist or may not be a record log")
    }
}

impl From<ClientError> for RlError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::DaemonNotRunning(addr) => {
                RlError::daemon_not_running(addr).with_source(err)
            }
            ClientError::DaemonStartTimeout => RlError::new("Timed out waiting for daemon")
                .with_suggestion("Raise the wait with RL_TIMEOUT_CONNECT_MS")
                .with_source(err),
            ClientError::BadRequest(ref message) => {
                RlError::new(format!("Daemon rejected the request: {}", message))
                    .with_context("The client and daemon may be different versions")
                    .with_suggestion("Restart the daemon: rl daemon stop && rl daemon start")
                    .with_source(err)
            }
            _ => RlError::new(err.to_string()).with_source(err),
        }
    }
}
