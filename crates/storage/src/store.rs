// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-framed record store over a single append-only file
//!
//! Appends go through a write buffer; `size` tracks the logical length of
//! the file including bytes that are still buffered. Every read flushes the
//! buffer first, so a frame appended earlier is always visible to a later
//! read. All operations serialize on one mutex, which is what keeps a
//! half-written frame from ever being observed.

use crate::error::{Result, StorageError};
use crate::frame::{decode_header, encode_header, frame_width, LEN_WIDTH};
use rl_core::config::DEFAULT_BUFFER_CAPACITY;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info, trace, warn};

/// Store tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Size of the write buffer in bytes
    pub buffer_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Open file state, only reachable through the store's lock
struct StoreFile {
    writer: BufWriter<File>,
    size: u64,
    /// Set when a failed frame could not be rolled back; appends are refused
    faulted: bool,
}

impl StoreFile {
    fn file(&self) -> &File {
        self.writer.get_ref()
    }

    fn write_frame(&mut self, payload: &[u8]) -> io::Result<()> {
        self.writer.write_all(&encode_header(payload.len() as u64))?;
        self.writer.write_all(payload)
    }

    /// Drop the bytes of a failed frame, keeping everything up to `size`
    ///
    /// The failed frame sits at the logical tail, which is split between
    /// the file and the write buffer. The file is always handed back; when
    /// the tail cannot be restored the returned state is faulted.
    fn rollback(self, capacity: usize) -> (Self, io::Result<()>) {
        let size = self.size;
        let (file, buffered) = self.writer.into_parts();
        let mut buffered = buffered.unwrap_or_else(|panicked| panicked.into_inner());

        let trimmed = file.metadata().and_then(|meta| {
            let on_disk = meta.len();
            if on_disk > size {
                file.set_len(size)?;
                buffered.clear();
            } else {
                buffered.truncate((size - on_disk) as usize);
            }
            Ok(())
        });

        let mut writer = BufWriter::with_capacity(capacity, file);
        let result = trimmed.and_then(|()| writer.write_all(&buffered));
        let faulted = result.is_err();
        (
            Self {
                writer,
                size,
                faulted,
            },
            result,
        )
    }
}

/// Append-only store of length-prefixed frames
pub struct Store {
    path: PathBuf,
    buffer_capacity: usize,
    /// `None` once closed
    state: Mutex<Option<StoreFile>>,
}

impl Store {
    /// Open or create the store file at `path`
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

        Self::from_file(file, path, config)
    }

    /// Wrap an already opened file
    ///
    /// The file must be readable and opened for appending. The store resumes
    /// at the file's current length; existing bytes are not validated.
    pub fn from_file(file: File, path: &Path, config: &StoreConfig) -> Result<Self> {
        let size = file.metadata()?.len();
        info!(path = %path.display(), size, "opened record store");

        Ok(Self {
            path: path.to_path_buf(),
            buffer_capacity: config.buffer_capacity,
            state: Mutex::new(Some(StoreFile {
                writer: BufWriter::with_capacity(config.buffer_capacity, file),
                size,
                faulted: false,
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<StoreFile>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append one frame holding `payload`
    ///
    /// Returns `(bytes_written, position)`: the frame width (`8 + len`) and
    /// the position the frame starts at. The frame is buffered, not synced.
    /// A failed write leaves `size` unchanged and the store open.
    pub fn append(&self, payload: &[u8]) -> Result<(u64, u64)> {
        let mut guard = self.lock();
        let store = guard.as_mut().ok_or(StorageError::Closed)?;
        if store.faulted {
            return Err(io::Error::other("store faulted by an earlier failed append").into());
        }
        let position = store.size;

        if let Err(e) = store.write_frame(payload) {
            warn!(position, error = %e, "frame write failed, rolling back");
            if let Some(failed) = guard.take() {
                let (restored, rolled_back) = failed.rollback(self.buffer_capacity);
                if let Err(rollback_err) = rolled_back {
                    error!(
                        path = %self.path.display(),
                        error = %rollback_err,
                        "rollback failed, refusing further appends"
                    );
                }
                *guard = Some(restored);
            }
            return Err(e.into());
        }

        let written = frame_width(payload.len() as u64);
        store.size += written;
        trace!(position, written, "appended frame");
        Ok((written, position))
    }

    /// Read the payload of the frame starting at `position`
    pub fn read(&self, position: u64) -> Result<Vec<u8>> {
        let mut guard = self.lock();
        let store = guard.as_mut().ok_or(StorageError::Closed)?;
        store.writer.flush()?;
        let size = store.size;

        let payload_position = position
            .checked_add(LEN_WIDTH)
            .filter(|end| *end <= size)
            .ok_or(StorageError::OutOfRange { position, size })?;

        let mut header = [0u8; LEN_WIDTH as usize];
        store.file().read_exact_at(&mut header, position)?;
        let len = decode_header(header);

        payload_position
            .checked_add(len)
            .filter(|end| *end <= size)
            .ok_or(StorageError::OutOfRange { position, size })?;

        let mut payload = vec![0u8; len as usize];
        store.file().read_exact_at(&mut payload, payload_position)?;
        Ok(payload)
    }

    /// Fill `buf` with bytes starting at `offset`
    ///
    /// Returns the number of bytes read, which is `buf.len()` on success.
    /// Running into the end of the file fails with `EndOfStream`, which
    /// carries how many bytes were read before that.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let mut guard = self.lock();
        let store = guard.as_mut().ok_or(StorageError::Closed)?;
        store.writer.flush()?;

        let file = store.file();
        let mut read = 0;
        while read < buf.len() {
            match file.read_at(&mut buf[read..], offset + read as u64) {
                Ok(0) => return Err(StorageError::EndOfStream { offset, read }),
                Ok(n) => read += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(read)
    }

    /// Flush buffered frames to the file
    pub fn flush(&self) -> Result<()> {
        let mut guard = self.lock();
        let store = guard.as_mut().ok_or(StorageError::Closed)?;
        store.writer.flush()?;
        Ok(())
    }

    /// Flush and fsync file data
    pub fn sync(&self) -> Result<()> {
        let mut guard = self.lock();
        let store = guard.as_mut().ok_or(StorageError::Closed)?;
        store.writer.flush()?;
        store.file().sync_data()?;
        Ok(())
    }

    /// Flush, sync and close the file
    ///
    /// Closing twice is a no-op. If the flush fails the store stays open so
    /// the caller can retry.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.lock();
        let Some(mut store) = guard.take() else {
            return Ok(());
        };

        if let Err(e) = store.writer.flush() {
            *guard = Some(store);
            return Err(e.into());
        }

        let size = store.size;
        let (file, _) = store.writer.into_parts();
        file.sync_all()?;
        info!(path = %self.path.display(), size, "closed record store");
        Ok(())
    }

    /// Logical size in bytes, including buffered frames
    pub fn size(&self) -> Result<u64> {
        let guard = self.lock();
        guard
            .as_ref()
            .map(|store| store.size)
            .ok_or(StorageError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
