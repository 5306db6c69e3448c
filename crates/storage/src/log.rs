// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Offset assignment and resolution
//!
//! A log hands out dense, zero-based offsets in the order its lock is
//! acquired. Under contention that can differ from the order requests
//! arrived in; callers only get the guarantee that offsets never collide
//! and never skip.

use crate::error::{Result, StorageError};
use crate::frame;
use crate::store::{Store, StoreConfig};
use rl_core::Record;
use std::fs::OpenOptions;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Persistence capability shared by the file-backed and in-memory logs
pub trait RecordLog: Send + Sync {
    /// Append a payload, returning the offset assigned to it
    fn append(&self, value: &[u8]) -> Result<u64>;

    /// Read the record at `offset`
    ///
    /// Fails with `OffsetNotFound` when `offset` has not been assigned yet.
    fn read(&self, offset: u64) -> Result<Record>;

    /// Number of records appended so far
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push buffered records to the backing medium
    fn flush(&self) -> Result<()>;

    /// Flush and release the backing medium
    fn close(&self) -> Result<()>;
}

struct LogIndex {
    /// Byte position of each record's frame, indexed by offset
    positions: Vec<u64>,
    closed: bool,
}

/// Record log over a single [`Store`]
pub struct FileLog {
    store: Store,
    index: Mutex<LogIndex>,
}

impl FileLog {
    /// Open or create the log file at `path`
    ///
    /// Existing frames are scanned to rebuild the offset index. An incomplete
    /// trailing frame left by a crash mid-append is truncated away. A file
    /// that is at least one header long but holds no complete frame fails
    /// with `InvalidData` and is left untouched.
    pub fn open(path: &Path, config: &StoreConfig) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let file_len = file.metadata()?.len();
        let report = frame::scan(BufReader::new(&file), file_len)?;

        // Without a single complete frame the bytes are not ours to cut
        if report.frames.is_empty() && file_len >= frame::LEN_WIDTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} holds no complete record frame (valid_len {}, file_len {})",
                    path.display(),
                    report.valid_len,
                    file_len
                ),
            )
            .into());
        }

        if report.is_torn() {
            warn!(
                path = %path.display(),
                valid_len = report.valid_len,
                file_len,
                "truncating incomplete trailing frame"
            );
            file.set_len(report.valid_len)?;
        }

        let positions: Vec<u64> = report.frames.iter().map(|f| f.position).collect();
        info!(
            path = %path.display(),
            records = positions.len(),
            "recovered record log"
        );

        let store = Store::from_file(file, path, config)?;
        Ok(Self {
            store,
            index: Mutex::new(LogIndex {
                positions,
                closed: false,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LogIndex> {
        self.index.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Byte position of the frame holding `offset`
    pub fn position_of(&self, offset: u64) -> Result<u64> {
        let index = self.lock();
        if index.closed {
            return Err(StorageError::Closed);
        }
        usize::try_from(offset)
            .ok()
            .and_then(|i| index.positions.get(i).copied())
            .ok_or(StorageError::OffsetNotFound(offset))
    }

    /// Underlying store
    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl RecordLog for FileLog {
    fn append(&self, value: &[u8]) -> Result<u64> {
        let mut index = self.lock();
        if index.closed {
            return Err(StorageError::Closed);
        }

        // The offset exists only once the store accepted the whole frame
        let (_, position) = self.store.append(value)?;
        index.positions.push(position);
        let offset = index.positions.len() as u64 - 1;
        debug!(offset, position, len = value.len(), "appended record");
        Ok(offset)
    }

    fn read(&self, offset: u64) -> Result<Record> {
        let position = self.position_of(offset)?;
        let value = self.store.read(position)?;
        Ok(Record::at(offset, value))
    }

    fn len(&self) -> u64 {
        self.lock().positions.len() as u64
    }

    fn flush(&self) -> Result<()> {
        if self.lock().closed {
            return Err(StorageError::Closed);
        }
        self.store.flush()
    }

    fn close(&self) -> Result<()> {
        let mut index = self.lock();
        if index.closed {
            return Ok(());
        }
        self.store.close()?;
        index.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
