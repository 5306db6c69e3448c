// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record Log Daemon (rld)
//!
//! Background process that owns the record file and serves produce/consume
//! requests over TCP.

use std::path::PathBuf;

use rl_core::Config;
use rl_daemon::lifecycle::{self, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional config file path
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let config = Config::load(config_path.as_deref())?;

    // Write startup marker to log (before tracing setup, so CLI can find it)
    lifecycle::write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!("Starting rld with data dir: {}", config.data_dir.display());

    let mut daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            lifecycle::write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("Daemon ready, listening on {}", daemon.local_addr()?);

    // Signal ready for parent process (e.g., systemd, CLI waiting for startup)
    println!("READY");

    let stop = async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    };

    if let Err(e) = daemon.run(stop).await {
        error!("Daemon shutdown failed: {}", e);
        return Err(e.into());
    }

    info!("Daemon stopped");
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = config.daemon_log_path();
    let dir = log_path
        .parent()
        .ok_or_else(|| LifecycleError::NoLogDir(log_path.clone()))?;
    let file_name = log_path
        .file_name()
        .ok_or_else(|| LifecycleError::NoLogDir(log_path.clone()))?;
    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(guard)
}
