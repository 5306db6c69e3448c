// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rl-storage: durable append-only record storage
//!
//! - [`Store`]: length-framed bytes in one file, buffered writes, positional reads
//! - [`FileLog`]: offsets over a `Store`, recovered by scanning on open
//! - [`MemoryLog`]: the same [`RecordLog`] capability without persistence

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod frame;
mod log;
mod memory;
mod store;

pub use error::{Result, StorageError};
pub use frame::{FrameHeader, ScanReport, LEN_WIDTH};
pub use log::{FileLog, RecordLog};
pub use memory::MemoryLog;
pub use store::{Store, StoreConfig};
