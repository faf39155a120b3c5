//! Container decode/encode
//!
//! Decoding reads the whole container from a byte slice and never checks
//! the stored checksum; the games do not verify it on load either.
//! Encoding always recomputes the checksum.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

use super::checksum::{finalize, Padding};
use super::{Container, Entry, ENTRY_SIZE, HEADER_SIZE};
use crate::error::{ChartError, Result};

/// Parsed header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub checksum: u32,
    pub entry_count: u32,
    pub string_blob_size: u32,
}

impl Header {
    /// Read the 16-byte header
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ChartError::TruncatedHeader {
                actual: bytes.len(),
            });
        }

        let mut reader = Cursor::new(&bytes[..HEADER_SIZE]);
        Ok(Self {
            version: reader.read_u32::<BigEndian>()?,
            checksum: reader.read_u32::<BigEndian>()?,
            entry_count: reader.read_u32::<BigEndian>()?,
            string_blob_size: reader.read_u32::<BigEndian>()?,
        })
    }

    /// Byte offset of the string blob
    pub fn string_blob_offset(&self) -> usize {
        HEADER_SIZE + self.entry_count as usize * ENTRY_SIZE
    }
}

/// Decode a container from raw file bytes
///
/// # Errors
/// * `TruncatedHeader` - fewer than 16 bytes
/// * `TruncatedEntries` - file ends inside the entry table
/// * `TruncatedStringBlob` - file ends inside the string blob
pub fn decode(bytes: &[u8]) -> Result<Container> {
    let header = Header::from_bytes(bytes)?;

    let blob_offset = header.string_blob_offset();
    if bytes.len() < blob_offset {
        return Err(ChartError::TruncatedEntries {
            entry_count: header.entry_count,
            expected: blob_offset,
            actual: bytes.len(),
        });
    }

    let blob_end = blob_offset + header.string_blob_size as usize;
    if bytes.len() < blob_end {
        return Err(ChartError::TruncatedStringBlob {
            expected: blob_end,
            actual: bytes.len(),
        });
    }

    let mut reader = Cursor::new(&bytes[HEADER_SIZE..blob_offset]);
    let mut entries = Vec::with_capacity(header.entry_count as usize);
    for _ in 0..header.entry_count {
        entries.push(read_entry(&mut reader)?);
    }

    Ok(Container {
        version: header.version,
        checksum: header.checksum,
        entries,
        string_blob: bytes[blob_offset..blob_end].to_vec(),
    })
}

fn read_entry<R: Read>(reader: &mut R) -> Result<Entry> {
    Ok(Entry {
        start: reader.read_f32::<BigEndian>()?,
        note_type: reader.read_u32::<BigEndian>()?,
        length: reader.read_f32::<BigEndian>()?,
        aux: reader.read_u32::<BigEndian>()?,
    })
}

/// Encode a container, recomputing its checksum and appending padding
pub fn encode(container: &Container, padding: Padding) -> Vec<u8> {
    let finalized = finalize(&container.entries, &container.string_blob, padding);

    let size = HEADER_SIZE
        + container.entry_table_size()
        + container.string_blob.len()
        + finalized.padding_len;
    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(&header_bytes(container, finalized.checksum));
    for entry in &container.entries {
        out.extend_from_slice(&entry.to_bytes());
    }
    out.extend_from_slice(&container.string_blob);
    out.resize(size, 0);
    out
}

fn header_bytes(container: &Container, checksum: u32) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    BigEndian::write_u32_into(
        &[
            container.version,
            checksum,
            container.entry_count(),
            container.string_blob_size(),
        ],
        &mut header,
    );
    header
}
