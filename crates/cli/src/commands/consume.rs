// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rl consume` - read a record by offset

use anyhow::Result;

use crate::client::DaemonClient;
use crate::error::RlError;
use crate::output::OutputFormat;

#[derive(clap::Args)]
pub struct ConsumeArgs {
    /// Offset of the record to read
    pub offset: u64,
}

pub async fn handle(client: &DaemonClient, args: ConsumeArgs, format: OutputFormat) -> Result<()> {
    let record = client
        .consume(args.offset)
        .await
        .map_err(RlError::from)?
        .ok_or_else(|| RlError::offset_not_found(args.offset))?;

    match format {
        OutputFormat::Text => println!("{}", record.value_lossy()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
    }
    Ok(())
}
