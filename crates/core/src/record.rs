// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Records stored in the log
//!
//! A record is an opaque payload plus the offset the log assigned to it.
//! Callers never choose offsets; an inbound record's offset is ignored.

use serde::{Deserialize, Serialize};

/// A single record in the log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Raw payload bytes (base64 in JSON)
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
    /// Zero-based position in the logical log
    #[serde(default)]
    pub offset: u64,
}

impl Record {
    /// Create a record that has not been assigned an offset yet
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
            offset: 0,
        }
    }

    /// Create a record at a known offset
    pub fn at(offset: u64, value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
            offset,
        }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Payload rendered as text, replacing invalid UTF-8
    pub fn value_lossy(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
