// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rl status` - uptime and record count

use anyhow::Result;

use crate::client::DaemonClient;
use crate::error::RlError;
use crate::output::{self, OutputFormat};

pub async fn handle(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let status = client.status().await.map_err(RlError::from)?;
    output::print(&status, format);
    Ok(())
}
