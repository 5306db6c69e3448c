// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk record framing
//!
//! Every record is stored as a frame:
//!
//! ```text
//! [8 bytes: big-endian payload length L][L bytes: payload][8 bytes: len][...]
//! ```
//!
//! There is no checksum, trailer or file header. A file is the concatenation
//! of frames starting at position 0.

use std::io::{self, Read, Seek, SeekFrom};

/// Width of the length header in bytes
pub const LEN_WIDTH: u64 = 8;

/// Encode a payload length as a frame header
pub fn encode_header(len: u64) -> [u8; LEN_WIDTH as usize] {
    len.to_be_bytes()
}

/// Decode a frame header into the payload length it announces
pub fn decode_header(header: [u8; LEN_WIDTH as usize]) -> u64 {
    u64::from_be_bytes(header)
}

/// Total bytes a frame occupies for a payload of `payload_len` bytes
pub fn frame_width(payload_len: u64) -> u64 {
    LEN_WIDTH + payload_len
}

/// Location of one complete frame in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Byte position of the frame's length header
    pub position: u64,
    /// Payload length
    pub len: u64,
}

impl FrameHeader {
    /// Position of the first payload byte
    pub fn payload_position(&self) -> u64 {
        self.position + LEN_WIDTH
    }

    /// Position just past the end of this frame
    pub fn end(&self) -> u64 {
        self.position + frame_width(self.len)
    }
}

/// Sequential scanner over the frames of a file
///
/// Stops at the first frame that is not fully present (a torn write). The
/// position of that frame is reported by [`FrameScanner::torn_at`].
pub struct FrameScanner<R> {
    reader: R,
    position: u64,
    file_len: u64,
    torn_at: Option<u64>,
}

impl<R: Read + Seek> FrameScanner<R> {
    /// Scan `file_len` bytes of `reader`, starting at position 0
    pub fn new(reader: R, file_len: u64) -> Self {
        Self {
            reader,
            position: 0,
            file_len,
            torn_at: None,
        }
    }

    /// Position just past the last complete frame seen so far
    pub fn valid_len(&self) -> u64 {
        self.position
    }

    /// Position of an incomplete trailing frame, if one was found
    pub fn torn_at(&self) -> Option<u64> {
        self.torn_at
    }

    fn read_next(&mut self) -> io::Result<Option<FrameHeader>> {
        let remaining = self.file_len - self.position;
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < LEN_WIDTH {
            self.torn_at = Some(self.position);
            return Ok(None);
        }

        let mut header = [0u8; LEN_WIDTH as usize];
        self.reader.read_exact(&mut header)?;
        let len = decode_header(header);

        if len > remaining - LEN_WIDTH {
            self.torn_at = Some(self.position);
            return Ok(None);
        }

        // len fits in the file, so it fits in i64
        self.reader.seek(SeekFrom::Current(len as i64))?;

        let frame = FrameHeader {
            position: self.position,
            len,
        };
        self.position = frame.end();
        Ok(Some(frame))
    }
}

impl<R: Read + Seek> Iterator for FrameScanner<R> {
    type Item = io::Result<FrameHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.torn_at.is_some() {
            return None;
        }
        self.read_next().transpose()
    }
}

/// Result of scanning a whole file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Every complete frame, in file order
    pub frames: Vec<FrameHeader>,
    /// Bytes covered by complete frames
    pub valid_len: u64,
    /// Length of the file when scanned
    pub file_len: u64,
}

impl ScanReport {
    /// Whether the file ends in an incomplete frame
    pub fn is_torn(&self) -> bool {
        self.valid_len < self.file_len
    }
}

/// Scan every frame of `reader`
pub fn scan<R: Read + Seek>(reader: R, file_len: u64) -> io::Result<ScanReport> {
    let mut scanner = FrameScanner::new(reader, file_len);
    let frames = scanner.by_ref().collect::<io::Result<Vec<_>>>()?;
    Ok(ScanReport {
        frames,
        valid_len: scanner.valid_len(),
        file_len,
    })
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
