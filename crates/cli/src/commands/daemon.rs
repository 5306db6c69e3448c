// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rl daemon` - start, stop and inspect the background daemon

use anyhow::Result;
use clap::{Args, Subcommand};
use rl_core::Config;

use crate::client::{self, ClientError, DaemonClient};
use crate::error::RlError;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start rld in the background
    Start,
    /// Ask rld to shut down
    Stop,
    /// Show whether rld is running
    Status,
}

pub async fn daemon(args: DaemonArgs, client: &DaemonClient, config: &Config) -> Result<()> {
    match args.command {
        DaemonCommand::Start => start(client, config).await,
        DaemonCommand::Stop => stop(client, config).await,
        DaemonCommand::Status => status(client, config).await,
    }
}

async fn start(client: &DaemonClient, config: &Config) -> Result<()> {
    match client::daemon_start(client, config).await {
        Ok(true) => println!("Daemon started at {}", client.addr()),
        Ok(false) => println!("Daemon already running at {}", client.addr()),
        Err(ClientError::DaemonStartFailed(reason)) => {
            return Err(RlError::daemon_start_failed(&reason, &config.daemon_log_path()).into());
        }
        Err(e) => return Err(RlError::from(e).into()),
    }
    Ok(())
}

async fn stop(client: &DaemonClient, config: &Config) -> Result<()> {
    if client::daemon_stop(client, config)
        .await
        .map_err(RlError::from)?
    {
        println!("Daemon stopped");
    } else {
        println!("Daemon not running");
    }
    Ok(())
}

async fn status(client: &DaemonClient, config: &Config) -> Result<()> {
    let version = match client.hello().await {
        Ok(version) => version,
        Err(ClientError::DaemonNotRunning(_)) => {
            println!("Daemon not running");
            return Ok(());
        }
        Err(e) => return Err(RlError::from(e).into()),
    };

    let status = client.status().await.map_err(RlError::from)?;
    println!("{}", status);
    println!("  version: {}", version);
    if let Some(pid) = client::read_daemon_pid(config) {
        println!("  pid:     {}", pid);
    }
    println!("  data:    {}", config.data_dir.display());
    Ok(())
}
