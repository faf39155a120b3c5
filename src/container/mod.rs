//! Chart container model
//!
//! Both game dialects share one layout, big-endian throughout:
//!
//! ```text
//! Header (16 bytes): version:u32, checksum:u32, entry_count:u32, string_blob_size:u32
//! Entry  (16 bytes): start:f32, note_type:u32, length:f32, auxiliary:u32
//! String blob:       string_blob_size bytes of NUL-terminated UTF-8
//! ```
//!
//! Start and length are measured in measures (0-indexed). The meaning of
//! `auxiliary` depends on the note type (see [`crate::notes::AuxKind`]).

use byteorder::{BigEndian, ByteOrder};

pub mod checksum;
pub mod codec;
pub mod strings;

pub use checksum::{checksum, finalize, Finalized, Padding};
pub use codec::{decode, encode};
pub use strings::StringBlob;

/// Size of the container header in bytes
pub const HEADER_SIZE: usize = 16;

/// Size of one serialized entry in bytes
pub const ENTRY_SIZE: usize = 16;

/// Output alignment for the tabular and migration paths
pub const ALIGN_SIZE: usize = 32;

/// Version tag the games' own charts carry
pub const DEFAULT_VERSION: u32 = 2;

/// One timestamped event record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    /// Start position in measures
    pub start: f32,
    /// Dialect-specific note type code
    pub note_type: u32,
    /// Length in measures
    pub length: f32,
    /// Integer, f32 bit pattern or on-disk string pointer
    pub aux: u32,
}

impl Entry {
    /// Create an entry with an integer auxiliary value
    pub fn new(start: f32, note_type: u32, length: f32, aux: u32) -> Self {
        Self {
            start,
            note_type,
            length,
            aux,
        }
    }

    /// Create an entry whose auxiliary value is a float parameter
    pub fn with_float_aux(start: f32, note_type: u32, length: f32, aux: f32) -> Self {
        Self::new(start, note_type, length, aux.to_bits())
    }

    /// Auxiliary value reinterpreted as a float
    pub fn aux_f32(&self) -> f32 {
        f32::from_bits(self.aux)
    }

    /// Serialize to the 16-byte on-disk form
    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut bytes = [0u8; ENTRY_SIZE];
        BigEndian::write_f32(&mut bytes[0..4], self.start);
        BigEndian::write_u32(&mut bytes[4..8], self.note_type);
        BigEndian::write_f32(&mut bytes[8..12], self.length);
        BigEndian::write_u32(&mut bytes[12..16], self.aux);
        bytes
    }
}

/// A whole chart file held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    /// Header version tag (1 or 2)
    pub version: u32,
    /// Checksum as stored in the source file (not verified on read)
    pub checksum: u32,
    /// Entries in file order
    pub entries: Vec<Entry>,
    /// Raw string blob, empty when the file has none
    pub string_blob: Vec<u8>,
}

impl Container {
    /// Create a container whose stored checksum matches its contents
    pub fn new(version: u32, entries: Vec<Entry>, string_blob: Vec<u8>) -> Self {
        let checksum = checksum::checksum(&entries, &string_blob);
        Self {
            version,
            checksum,
            entries,
            string_blob,
        }
    }

    /// Number of entries, as written to the header
    pub fn entry_count(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Size of the string blob, as written to the header
    pub fn string_blob_size(&self) -> u32 {
        self.string_blob.len() as u32
    }

    /// Size of the entry table in bytes
    pub fn entry_table_size(&self) -> usize {
        self.entries.len() * ENTRY_SIZE
    }

    /// Recompute the checksum and compare against the stored one
    pub fn verify_checksum(&self) -> bool {
        checksum::checksum(&self.entries, &self.string_blob) == self.checksum
    }
}
