//! Checksum and padding
//!
//! The header checksum is a zlib-polynomial CRC-32 over the entry count,
//! the string blob size, every serialized entry in final order and the blob.
//! The header's own version and checksum fields and any trailing padding are
//! not covered.

use crc32fast::Hasher;

use super::{Entry, ALIGN_SIZE, ENTRY_SIZE, HEADER_SIZE};

/// Trailing padding policy for an encoded container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// No padding
    None,
    /// Zero-pad the whole file to a multiple of the given unit
    Align(usize),
    /// Append one all-zero entry-sized row when the entry count is even.
    /// Charts written from the text form have always carried this row.
    EvenCountRow,
}

impl Default for Padding {
    fn default() -> Self {
        Padding::Align(ALIGN_SIZE)
    }
}

impl Padding {
    /// Number of padding bytes needed after `file_size` bytes of content
    pub fn padding_len(&self, file_size: usize, entry_count: usize) -> usize {
        match *self {
            Padding::None => 0,
            Padding::Align(unit) => align_remainder(file_size, unit),
            Padding::EvenCountRow => {
                if entry_count % 2 == 0 {
                    ENTRY_SIZE
                } else {
                    0
                }
            }
        }
    }
}

fn align_remainder(size: usize, unit: usize) -> usize {
    if unit == 0 {
        return 0;
    }
    match size % unit {
        0 => 0,
        offset => unit - offset,
    }
}

/// Checksum and padding for a container about to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finalized {
    /// CRC-32 for the header
    pub checksum: u32,
    /// Zero bytes to append after the string blob
    pub padding_len: usize,
}

/// Compute the header checksum for the given entries and string blob
pub fn checksum(entries: &[Entry], string_blob: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&(entries.len() as u32).to_be_bytes());
    hasher.update(&(string_blob.len() as u32).to_be_bytes());
    for entry in entries {
        hasher.update(&entry.to_bytes());
    }
    if !string_blob.is_empty() {
        hasher.update(string_blob);
    }
    hasher.finalize()
}

/// Compute the checksum and trailing padding for a container
pub fn finalize(entries: &[Entry], string_blob: &[u8], padding: Padding) -> Finalized {
    let file_size = HEADER_SIZE + entries.len() * ENTRY_SIZE + string_blob.len();
    Finalized {
        checksum: checksum(entries, string_blob),
        padding_len: padding.padding_len(file_size, entries.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_empty_checksum_matches_zlib() {
        // zlib.crc32(b"\x00" * 8)
        assert_eq!(checksum(&[], &[]), 0x6522DF69);
    }

    #[test]
    fn test_checksum_covers_blob() {
        let entries = vec![Entry::new(0.0, 0x0AFFFFFF, 0.0, 16)];
        let without = checksum(&entries, &[]);
        let with = checksum(&entries, b"DJ\0");
        assert_ne!(without, with);
    }

    #[test]
    fn test_checksum_is_order_sensitive() {
        let a = Entry::new(0.0, 0, 0.03125, 0);
        let b = Entry::new(1.0, 1, 0.03125, 0);
        assert_ne!(checksum(&[a, b], &[]), checksum(&[b, a], &[]));
    }

    #[test_case(16, 0, 16 ; "header only")]
    #[test_case(32, 1, 0 ; "already aligned")]
    #[test_case(48, 2, 16 ; "two entries")]
    #[test_case(51, 2, 13 ; "odd blob")]
    fn test_align_32(file_size: usize, entries: usize, expected: usize) {
        assert_eq!(Padding::default().padding_len(file_size, entries), expected);
        assert_eq!(Padding::Align(32).padding_len(file_size, entries), expected);
    }

    #[test_case(0, 16)]
    #[test_case(1, 0)]
    #[test_case(4, 16)]
    #[test_case(7, 0)]
    fn test_even_count_row(entries: usize, expected: usize) {
        let size = HEADER_SIZE + entries * ENTRY_SIZE;
        assert_eq!(Padding::EvenCountRow.padding_len(size, entries), expected);
    }

    #[test]
    fn test_finalize() {
        let entries = vec![Entry::new(0.0, 2, 0.03125, 0)];
        let finalized = finalize(&entries, b"A\0", Padding::Align(32));
        assert_eq!(finalized.checksum, checksum(&entries, b"A\0"));
        // 16 + 16 + 2 = 34 -> 64
        assert_eq!(finalized.padding_len, 30);
    }
}
