// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Cursor;
use yare::parameterized;

fn frames(payloads: &[&[u8]]) -> Vec<u8> {
    let mut buf = Vec::new();
    for payload in payloads {
        buf.extend_from_slice(&encode_header(payload.len() as u64));
        buf.extend_from_slice(payload);
    }
    buf
}

fn scan_bytes(bytes: Vec<u8>) -> ScanReport {
    let len = bytes.len() as u64;
    scan(Cursor::new(bytes), len).unwrap()
}

#[test]
fn header_is_big_endian() {
    assert_eq!(encode_header(11), [0, 0, 0, 0, 0, 0, 0, 11]);
    assert_eq!(encode_header(0x0102), [0, 0, 0, 0, 0, 0, 1, 2]);
    assert_eq!(decode_header([0, 0, 0, 0, 0, 0, 1, 2]), 0x0102);
}

#[test]
fn frame_width_includes_header() {
    assert_eq!(frame_width(11), 19);
    assert_eq!(frame_width(0), LEN_WIDTH);
}

#[test]
fn scan_finds_every_frame() {
    let report = scan_bytes(frames(&[b"hello world", b"", b"abc"]));

    assert_eq!(
        report.frames,
        vec![
            FrameHeader { position: 0, len: 11 },
            FrameHeader { position: 19, len: 0 },
            FrameHeader { position: 27, len: 3 },
        ]
    );
    assert_eq!(report.valid_len, 38);
    assert!(!report.is_torn());
}

#[test]
fn scan_of_empty_file_is_empty() {
    let report = scan_bytes(Vec::new());
    assert!(report.frames.is_empty());
    assert_eq!(report.valid_len, 0);
    assert!(!report.is_torn());
}

#[test]
fn scan_stops_at_partial_header() {
    let mut bytes = frames(&[b"one"]);
    bytes.extend_from_slice(&[0, 0, 0]);

    let report = scan_bytes(bytes);
    assert_eq!(report.frames.len(), 1);
    assert_eq!(report.valid_len, 11);
    assert_eq!(report.file_len, 14);
    assert!(report.is_torn());
}

#[test]
fn scan_stops_at_partial_payload() {
    let mut bytes = frames(&[b"one", b"two"]);
    bytes.extend_from_slice(&encode_header(100));
    bytes.extend_from_slice(b"short");

    let report = scan_bytes(bytes);
    assert_eq!(report.frames.len(), 2);
    assert_eq!(report.valid_len, 22);
    assert!(report.is_torn());
}

#[test]
fn scanner_reports_torn_position() {
    let mut bytes = frames(&[b"one"]);
    bytes.extend_from_slice(&encode_header(u64::MAX));
    let len = bytes.len() as u64;

    let mut scanner = FrameScanner::new(Cursor::new(bytes), len);
    assert!(scanner.next().is_some());
    assert!(scanner.next().is_none());
    assert_eq!(scanner.torn_at(), Some(11));
    // Stays stopped
    assert!(scanner.next().is_none());
}

#[test]
fn frame_header_positions() {
    let frame = FrameHeader {
        position: 19,
        len: 11,
    };
    assert_eq!(frame.payload_position(), 27);
    assert_eq!(frame.end(), 38);
}

// "first" is 13 bytes framed, "second" 14
#[parameterized(
    empty = { 0, 0 },
    inside_first_header = { 5, 0 },
    inside_first_payload = { 10, 0 },
    first_complete = { 13, 13 },
    inside_second_header = { 20, 13 },
    inside_second_payload = { 26, 13 },
    both_complete = { 27, 27 },
)]
fn scan_stops_at_last_complete_frame(cut: usize, expected: u64) {
    let mut bytes = frames(&[b"first", b"second"]);
    bytes.truncate(cut);

    let report = scan_bytes(bytes);
    assert_eq!(report.valid_len, expected);
    assert_eq!(report.is_torn(), expected != cut as u64);
}
