//! Error handling for chartconv
//!
//! Errors fall into two groups. Fatal errors (format, range, argument, I/O)
//! abort a conversion before any output is written. Non-fatal errors
//! (unknown note types, overlapping crossfades) are only ever logged and
//! collected into conversion reports.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for chartconv operations
pub type Result<T> = std::result::Result<T, ChartError>;

/// Main error type for chartconv operations
#[derive(Error, Debug)]
pub enum ChartError {
    // Format Errors
    #[error("Truncated header: need 16 bytes, got {actual}")]
    TruncatedHeader { actual: usize },

    #[error("Truncated entry table: {entry_count} entries need {expected} bytes, got {actual}")]
    TruncatedEntries {
        entry_count: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Truncated string blob: need {expected} bytes, got {actual}")]
    TruncatedStringBlob { expected: usize, actual: usize },

    #[error("String at blob offset {offset} is not valid UTF-8")]
    InvalidString {
        offset: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("Malformed row {row}: {reason}")]
    MalformedRow { row: u64, reason: String },

    // Range Errors
    #[error("String pointer {pointer} outside blob of {blob_size} bytes")]
    StringPointerOutOfRange { pointer: i64, blob_size: usize },

    // Non-fatal Diagnostics
    #[error("Unknown note type {code} (0x{code:08X}) at entry {index}")]
    UnknownNoteType { code: u32, index: usize },

    #[error("Overlapping crossfades around {start}: spike check skipped")]
    OverlappingCrossfades { start: f32 },

    // Argument Errors
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Cannot convert {path} to {target}")]
    UnsupportedConversion { path: PathBuf, target: String },

    // File Errors
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl ChartError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ChartError::TruncatedHeader { .. }
            | ChartError::TruncatedEntries { .. }
            | ChartError::TruncatedStringBlob { .. }
            | ChartError::InvalidString { .. }
            | ChartError::MalformedRow { .. } => "FORMAT_ERROR",
            ChartError::StringPointerOutOfRange { .. } => "RANGE_ERROR",
            ChartError::UnknownNoteType { .. } => "UNKNOWN_NOTE_TYPE",
            ChartError::OverlappingCrossfades { .. } => "OVERLAP_ERROR",
            ChartError::InvalidArgument { .. } | ChartError::UnsupportedConversion { .. } => {
                "ARGUMENT_ERROR"
            }
            ChartError::FileReadError { .. }
            | ChartError::FileWriteError { .. }
            | ChartError::Io(_) => "IO_ERROR",
            ChartError::Csv(_) => "CSV_ERROR",
            ChartError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Check if this error must abort the conversion
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ChartError::UnknownNoteType { .. } | ChartError::OverlappingCrossfades { .. }
        )
    }

    /// Check if the CLI should print its usage text alongside this error
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ChartError::InvalidArgument { .. } | ChartError::UnsupportedConversion { .. }
        )
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            ChartError::TruncatedHeader { .. }
            | ChartError::TruncatedEntries { .. }
            | ChartError::TruncatedStringBlob { .. } => {
                Some("The chart file is truncated. Re-extract it from the game archive.")
            }
            ChartError::MalformedRow { .. } => {
                Some("Edit the CSV in a plain text editor; each row needs 4 columns.")
            }
            ChartError::StringPointerOutOfRange { .. } => {
                Some("A text entry points outside the string blob; the chart may be corrupt.")
            }
            ChartError::UnsupportedConversion { .. } => {
                Some("Supported inputs: .fsgmub, .xmk, .csv, .chart")
            }
            _ => None,
        }
    }
}
