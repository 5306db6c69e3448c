// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rl produce` - append a record

use std::io::Read;

use anyhow::Result;
use serde::Serialize;

use crate::client::DaemonClient;
use crate::error::RlError;
use crate::output::{self, OutputFormat};

#[derive(clap::Args)]
pub struct ProduceArgs {
    /// Value to append, or `-` to read it from stdin
    pub value: String,
}

#[derive(Serialize)]
struct Produced {
    offset: u64,
}

impl std::fmt::Display for Produced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "offset: {}", self.offset)
    }
}

pub async fn handle(client: &DaemonClient, args: ProduceArgs, format: OutputFormat) -> Result<()> {
    let value = if args.value == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        args.value.into_bytes()
    };

    let offset = client.produce(value).await.map_err(RlError::from)?;
    output::print(&Produced { offset }, format);
    Ok(())
}
