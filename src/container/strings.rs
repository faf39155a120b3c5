//! String blob storage
//!
//! Text-bearing entries (author, section names) keep their text in a blob of
//! NUL-terminated UTF-8 after the entry table. On disk an entry's auxiliary
//! field points at its string measured from the start of the entry table,
//! so every pointer moves when the entry count changes. In memory we only
//! carry blob-relative offsets and convert at the file boundary.

use super::ENTRY_SIZE;
use crate::error::{ChartError, Result};

/// Append-only blob of NUL-terminated strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringBlob {
    bytes: Vec<u8>,
}

impl StringBlob {
    /// Create an empty blob
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the raw blob read from a container
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Append `text` plus a terminating NUL and return its blob-relative
    /// offset. Strings are never deduplicated.
    pub fn intern(&mut self, text: &str) -> u32 {
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.push(0);
        offset
    }

    /// Read the string starting at a blob-relative offset
    ///
    /// # Errors
    /// * `StringPointerOutOfRange` - offset is not inside the blob
    /// * `InvalidString` - bytes up to the NUL are not UTF-8
    pub fn resolve(&self, offset: i64) -> Result<&str> {
        let start = self.check_offset(offset)?;
        let tail = &self.bytes[start..];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        std::str::from_utf8(&tail[..end]).map_err(|source| ChartError::InvalidString {
            offset: start,
            source,
        })
    }

    /// Range-check a blob-relative offset without decoding the string
    pub fn check_offset(&self, offset: i64) -> Result<usize> {
        if offset < 0 || offset >= self.bytes.len() as i64 {
            return Err(ChartError::StringPointerOutOfRange {
                pointer: offset,
                blob_size: self.bytes.len(),
            });
        }
        Ok(offset as usize)
    }

    /// Blob size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Convert a blob-relative offset to the on-disk pointer for a table of
/// `entry_count` entries
pub fn on_disk_pointer(offset: u32, entry_count: usize) -> u32 {
    offset.wrapping_add((entry_count * ENTRY_SIZE) as u32)
}

/// Convert an on-disk pointer back to a blob-relative offset. The result is
/// negative when the pointer lands inside the entry table.
pub fn relative_pointer(pointer: u32, entry_count: usize) -> i64 {
    pointer as i64 - (entry_count * ENTRY_SIZE) as i64
}
