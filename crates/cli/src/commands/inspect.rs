// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rl inspect` - walk the frames of a record file offline

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rl_storage::frame::decode_header;
use rl_storage::{StorageError, Store, StoreConfig, LEN_WIDTH};
use serde::Serialize;

use crate::error::RlError;
use crate::output::{self, OutputFormat};

const PREVIEW_LEN: usize = 32;

#[derive(clap::Args)]
pub struct InspectArgs {
    /// Record file to read (never modified)
    pub file: PathBuf,

    /// Stop after this many records
    #[arg(long)]
    pub limit: Option<usize>,
}

/// One frame found in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameEntry {
    pub offset: u64,
    pub position: u64,
    pub len: u64,
    pub preview: String,
}

/// Everything `inspect` found in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub path: PathBuf,
    pub size: u64,
    pub records: Vec<FrameEntry>,
    /// Position of an incomplete trailing frame
    pub torn_at: Option<u64>,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} bytes)", self.path.display(), self.size)?;
        writeln!(f, "{:>8} {:>12} {:>10}  PREVIEW", "OFFSET", "POSITION", "LENGTH")?;
        for entry in &self.records {
            writeln!(
                f,
                "{:>8} {:>12} {:>10}  {}",
                entry.offset, entry.position, entry.len, entry.preview
            )?;
        }
        write!(f, "{} records", self.records.len())?;
        if let Some(position) = self.torn_at {
            write!(
                f,
                "\ntorn tail at position {} ({} trailing bytes)",
                position,
                self.size - position
            )?;
        }
        Ok(())
    }
}

pub fn handle(args: InspectArgs, format: OutputFormat) -> Result<()> {
    let file = File::open(&args.file).map_err(|e| RlError::unreadable_log(&args.file).with_source(e))?;
    let store = Store::from_file(file, &args.file, &StoreConfig::default())
        .map_err(|e| RlError::unreadable_log(&args.file).with_source(e))?;

    let report = walk(&store, &args.file, args.limit)?;
    output::print(&report, format);
    Ok(())
}

/// Walk frames from position 0 using positional reads
pub fn walk(store: &Store, path: &Path, limit: Option<usize>) -> Result<InspectReport, StorageError> {
    let size = store.size()?;
    let mut records = Vec::new();
    let mut position = 0u64;
    let mut torn_at = None;

    while position < size {
        if limit.is_some_and(|limit| records.len() >= limit) {
            break;
        }
        if position + LEN_WIDTH > size {
            torn_at = Some(position);
            break;
        }

        let mut header = [0u8; LEN_WIDTH as usize];
        store.read_at(&mut header, position)?;
        let len = decode_header(header);

        let payload_position = position + LEN_WIDTH;
        let end = match payload_position.checked_add(len) {
            Some(end) if end <= size => end,
            _ => {
                torn_at = Some(position);
                break;
            }
        };

        let mut preview = vec![0u8; (len as usize).min(PREVIEW_LEN)];
        store.read_at(&mut preview, payload_position)?;

        records.push(FrameEntry {
            offset: records.len() as u64,
            position,
            len,
            preview: render_preview(&preview, len as usize > PREVIEW_LEN),
        });
        position = end;
    }

    Ok(InspectReport {
        path: path.to_path_buf(),
        size,
        records,
        torn_at,
    })
}

fn render_preview(bytes: &[u8], truncated: bool) -> String {
    let mut preview: String = String::from_utf8_lossy(bytes)
        .chars()
        .map(|c| if c.is_control() { '.' } else { c })
        .collect();
    if truncated {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;
