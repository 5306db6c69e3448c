// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, event loop, shutdown.

use std::fs::{File, OpenOptions};
use std::future::Future;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use fs2::FileExt;
use rl_core::Config;
use rl_storage::{FileLog, RecordLog, StoreConfig};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::server::{self, Service};

/// Startup marker prefix written to the log before anything else.
/// The CLI uses this to find where the current startup attempt begins.
/// Full format: "--- rld: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- rld: starting (pid: ";

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    listener: TcpListener,
    service: Arc<Service>,
    connections: JoinSet<()>,
}

impl DaemonState {
    /// Address the listener is bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn service(&self) -> &Arc<Service> {
        &self.service
    }

    /// Serve connections until `stop` resolves or a client requests shutdown,
    /// then shut down.
    pub async fn run<F>(&mut self, stop: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()>,
    {
        let mut shutdown_rx = self.service.subscribe_shutdown();
        let period = self.config.flush_interval;
        let mut flush_timer = tokio::time::interval_at(Instant::now() + period, period);
        flush_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(stop);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!(%peer, "Accepted connection");
                            let service = Arc::clone(&self.service);
                            self.connections.spawn(async move {
                                if let Err(e) = server::handle_connection(&service, stream).await {
                                    error!(%peer, "Error handling connection: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                        }
                    }
                }

                Some(result) = self.connections.join_next(), if !self.connections.is_empty() => {
                    if let Err(e) = result {
                        error!("Connection task failed: {}", e);
                    }
                }

                _ = flush_timer.tick() => {
                    if let Err(e) = self.service.log().flush() {
                        error!("Error flushing log: {}", e);
                    }
                }

                // Also sees a request made before the loop started
                _ = shutdown_rx.wait_for(|stop| *stop) => {
                    info!("Shutdown requested via IPC, shutting down...");
                    break;
                }

                _ = &mut stop => {
                    info!("Received stop signal, shutting down...");
                    break;
                }
            }
        }

        self.shutdown().await
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // In-flight requests finish before the log closes
        let timeout = self.config.request_timeout;
        let connections = &mut self.connections;
        let drain = async {
            while connections.join_next().await.is_some() {}
        };
        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!(
                "Aborting {} connections still in flight",
                self.connections.len()
            );
            self.connections.abort_all();
        }

        let closed = self.service.log().close();
        if let Err(e) = &closed {
            error!("Failed to close log: {}", e);
        }

        remove_if_exists(&self.config.lock_path(), "PID");
        remove_if_exists(&self.config.version_path(), "version");

        // Lock is released when self.lock_file is dropped
        closed?;
        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    Config(#[from] rl_core::ConfigError),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rl_storage::StorageError),

    #[error("Log file has no parent directory: {}", .0.display())]
    NoLogDir(std::path::PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        // Files belong to the daemon holding the lock
        Err(e @ LifecycleError::LockFailed(_)) => Err(e),
        Err(e) => {
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create data directory
    std::fs::create_dir_all(&config.data_dir)?;

    // 2. Acquire lock file FIRST - prevents races. Not truncated until held.
    let mut lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(config.lock_path())?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Write version file
    std::fs::write(config.version_path(), env!("CARGO_PKG_VERSION"))?;

    // 4. Open and recover the log BEFORE binding (don't accept connections if unreadable)
    let store_config = StoreConfig {
        buffer_capacity: config.buffer_capacity,
    };
    let log = FileLog::open(&config.records_path(), &store_config)?;
    info!(
        records = log.len(),
        path = %config.records_path().display(),
        "Opened record log"
    );

    // 5. Bind listener (LAST - only after all validation passes)
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.listen_addr, e))?;

    let log: Arc<dyn RecordLog> = Arc::new(log);
    let service = Arc::new(Service::new(log, config.request_timeout));

    info!("Daemon started with data dir: {}", config.data_dir.display());

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        service,
        connections: JoinSet::new(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    let _ = std::fs::remove_file(config.version_path());
    let _ = std::fs::remove_file(config.lock_path());
}

fn remove_if_exists(path: &std::path::Path, what: &str) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove {} file: {}", what, e);
        }
    }
}

/// Write startup marker to log file (appends to existing log)
pub fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    std::fs::create_dir_all(&config.data_dir)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.daemon_log_path())?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
/// This ensures the error is visible to the CLI even if the process exits quickly.
pub fn write_startup_error(config: &Config, error: &LifecycleError) {
    let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.daemon_log_path())
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
