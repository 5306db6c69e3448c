// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory record log for tests
//!
//! Nothing is persisted. Offsets, errors and close semantics match
//! [`FileLog`](crate::FileLog) so either can sit behind `dyn RecordLog`.

use crate::error::{Result, StorageError};
use crate::log::RecordLog;
use rl_core::Record;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    records: Vec<Vec<u8>>,
    closed: bool,
}

/// Record log held in a growable list behind a single lock
#[derive(Default)]
pub struct MemoryLog {
    state: Mutex<MemoryState>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecordLog for MemoryLog {
    fn append(&self, value: &[u8]) -> Result<u64> {
        let mut state = self.lock();
        if state.closed {
            return Err(StorageError::Closed);
        }
        state.records.push(value.to_vec());
        Ok(state.records.len() as u64 - 1)
    }

    fn read(&self, offset: u64) -> Result<Record> {
        let state = self.lock();
        if state.closed {
            return Err(StorageError::Closed);
        }
        usize::try_from(offset)
            .ok()
            .and_then(|i| state.records.get(i))
            .map(|value| Record::at(offset, value.clone()))
            .ok_or(StorageError::OffsetNotFound(offset))
    }

    fn len(&self) -> u64 {
        self.lock().records.len() as u64
    }

    fn flush(&self) -> Result<()> {
        if self.lock().closed {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
