//! CSV form of a binary chart
//!
//! One row per entry: `start, type, length, aux`. Metadata codes with a
//! symbolic name are written by name, everything else as a decimal code.
//! Text entries carry their string in the aux column and tempo entries
//! their BPM, so the file can be edited by hand and loaded back.

use std::io::{Read, Write};

use log::debug;

use crate::container::strings::{on_disk_pointer, relative_pointer};
use crate::container::{Container, Entry, StringBlob};
use crate::error::{ChartError, Result};
use crate::notes::{code_for_symbol, symbol_for_code, AuxKind, Dialect, NoteTypeTable};

/// Write a container as CSV rows
///
/// # Errors
/// * `StringPointerOutOfRange` - a text entry points outside the blob
/// * `InvalidString` - a text entry's string is not UTF-8
/// * `Csv` / `Io` - the writer failed
pub fn export_csv<W: Write>(container: &Container, writer: W) -> Result<()> {
    let blob = StringBlob::from_bytes(container.string_blob.clone());
    let count = container.entries.len();
    let mut csv_writer = csv::Writer::from_writer(writer);

    for entry in &container.entries {
        let note_type = match symbol_for_code(entry.note_type) {
            Some(name) => name.to_string(),
            None => entry.note_type.to_string(),
        };

        let aux = match aux_kind(entry.note_type) {
            AuxKind::StringPointer => blob.resolve(relative_pointer(entry.aux, count))?.to_string(),
            AuxKind::Float => format_float(entry.aux_f32()),
            AuxKind::Integer => entry.aux.to_string(),
        };

        csv_writer.write_record([
            format_float(entry.start),
            note_type,
            format_float(entry.length),
            aux,
        ])?;
    }

    csv_writer.flush()?;
    debug!("Wrote {} CSV rows", count);
    Ok(())
}

/// Render a container as CSV text
pub fn to_csv_string(container: &Container) -> Result<String> {
    let mut buf = Vec::new();
    export_csv(container, &mut buf)?;
    String::from_utf8(buf).map_err(|err| ChartError::InvalidString {
        offset: err.utf8_error().valid_up_to(),
        source: err.utf8_error(),
    })
}

/// How the aux column is written for a code
///
/// Text and tempo codes are the same in both dialects; anything the table
/// does not know is a plain integer.
fn aux_kind(code: u32) -> AuxKind {
    NoteTypeTable::for_dialect(Dialect::Djh2)
        .note_type(code)
        .map_or(AuxKind::Integer, |note_type| note_type.aux_kind())
}

/// Shortest text that reads back to the same f32
fn format_float(value: f32) -> String {
    format!("{:?}", f64::from(value))
}

/// Read CSV rows back into a container
///
/// Strings are interned in row order and their pointers computed against
/// the final row count.
///
/// # Errors
/// * `MalformedRow` - fewer than four columns or an unparseable field
/// * `Csv` - the reader failed
pub fn import_csv<R: Read>(reader: R, version: u32) -> Result<Container> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut entries = Vec::new();
    let mut string_slots = Vec::new();
    let mut blob = StringBlob::new();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = index as u64 + 1;
        if record.len() < 4 {
            return Err(malformed(row, format!("expected 4 columns, found {}", record.len())));
        }

        let start = parse_float(&record[0], row, "start")?;
        let length = parse_float(&record[2], row, "length")?;
        let note_type = match code_for_symbol(&record[1]) {
            Some(code) => code,
            None => record[1]
                .trim()
                .parse::<u32>()
                .map_err(|_| malformed(row, format!("unknown note type {:?}", &record[1])))?,
        };

        let aux = match aux_kind(note_type) {
            AuxKind::StringPointer => {
                string_slots.push(entries.len());
                blob.intern(&record[3])
            }
            AuxKind::Float => parse_float(&record[3], row, "tempo")?.to_bits(),
            AuxKind::Integer => record[3]
                .trim()
                .parse::<u32>()
                .map_err(|_| malformed(row, format!("invalid aux value {:?}", &record[3])))?,
        };

        entries.push(Entry::new(start, note_type, length, aux));
    }

    let count = entries.len();
    for slot in string_slots {
        if let Some(entry) = entries.get_mut(slot) {
            entry.aux = on_disk_pointer(entry.aux, count);
        }
    }

    debug!("Read {} CSV rows, {} bytes of strings", count, blob.len());
    Ok(Container::new(version, entries, blob.into_bytes()))
}

fn parse_float(field: &str, row: u64, column: &str) -> Result<f32> {
    field
        .trim()
        .parse::<f64>()
        .map(|value| value as f32)
        .map_err(|_| malformed(row, format!("invalid {} {:?}", column, field)))
}

fn malformed(row: u64, reason: String) -> ChartError {
    ChartError::MalformedRow { row, reason }
}
