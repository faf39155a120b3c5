//! chartconv - DJ Hero chart codec and converter
//!
//! Reads and writes the binary chart container shared by DJ Hero 1
//! (`.fsgmub`) and DJ Hero 2 (`.xmk`), and converts between:
//! - the two binary dialects, inferring crossfade spikes when upgrading
//! - binary charts and editable CSV rows
//! - binary charts and sectioned `.chart` text
//!
//! # Architecture
//!
//! - [`container`]: header/entry codec, checksum, padding, string blob
//! - [`notes`]: canonical note types and per-dialect code tables
//! - [`migrate`]: dialect migration and the spike classifier
//! - [`tabular`] and [`chart`]: the two text forms
//! - [`convert`]: routing by file extension and atomic output

pub mod chart;
pub mod cli;
pub mod config;
pub mod container;
pub mod convert;
pub mod error;
pub mod migrate;
pub mod notes;
pub mod tabular;

pub use config::{ConvertOptions, OutputFormat};
pub use container::{Container, Entry, Padding};
pub use convert::{Conversion, ConversionSummary};
pub use error::{ChartError, Result};
pub use notes::{Dialect, NoteType};
