// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rl - reclog CLI

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod error;
mod output;

use std::net::SocketAddr;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{consume, daemon, inspect, produce, status};
use rl_core::Config;

use crate::client::DaemonClient;
use crate::error::RlError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "rl", version, about = "reclog - append-only record log")]
struct Cli {
    /// Daemon address (defaults to the configured listen address)
    #[arg(long, global = true)]
    addr: Option<SocketAddr>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a record and print its offset
    Produce(produce::ProduceArgs),
    /// Print the record at an offset
    Consume(consume::ConsumeArgs),
    /// Show daemon uptime and record count
    Status,
    /// Daemon management
    Daemon(daemon::DaemonArgs),
    /// Walk the frames of a record file without the daemon
    Inspect(inspect::InspectArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<RlError>() {
                Some(rl_error) => eprint!("{}", rl_error),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.format;
    match cli.command {
        // Offline, no config or daemon needed
        Commands::Inspect(args) => inspect::handle(args, format),
        Commands::Produce(args) => {
            let (_, client) = connect(cli.addr)?;
            produce::handle(&client, args, format).await
        }
        Commands::Consume(args) => {
            let (_, client) = connect(cli.addr)?;
            consume::handle(&client, args, format).await
        }
        Commands::Status => {
            let (_, client) = connect(cli.addr)?;
            status::handle(&client, format).await
        }
        Commands::Daemon(args) => {
            let (config, client) = connect(cli.addr)?;
            daemon::daemon(args, &client, &config).await
        }
    }
}

/// Load the config, apply `--addr`, and build a client for the daemon
fn connect(addr: Option<SocketAddr>) -> Result<(Config, DaemonClient)> {
    let mut config = Config::load(None)?;
    if let Some(addr) = addr {
        config.listen_addr = addr;
    }
    let client = DaemonClient::new(config.listen_addr);
    Ok((config, client))
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
