// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage errors

use std::io;
use thiserror::Error;

/// Errors that can occur in store and log operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying storage fault (disk full, permissions, truncated file)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Read of an offset that has not been appended yet
    #[error("offset not found: {0}")]
    OffsetNotFound(u64),

    /// Operation attempted after close
    #[error("store is closed")]
    Closed,

    /// A read that would extend past the end of the store
    #[error("read at position {position} crosses store size {size}")]
    OutOfRange { position: u64, size: u64 },

    /// Positional read hit end of file before the buffer was filled
    #[error("end of stream at offset {offset} after {read} bytes")]
    EndOfStream { offset: u64, read: usize },
}

impl StorageError {
    /// Whether the error means "not there yet" rather than a fault
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::OffsetNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
