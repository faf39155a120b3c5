//! DJH1 <-> DJH2 chart migration
//!
//! Migration translates every entry's note code into the target dialect,
//! relocates string pointers for the new entry count and, when upgrading,
//! infers spikes from crossfade timing. Diagnostics that do not stop the
//! conversion are logged and collected into a [`MigrationReport`].

pub mod spike;

use log::{debug, info, warn};

use crate::container::strings::{on_disk_pointer, relative_pointer};
use crate::container::{Container, Entry, StringBlob, DEFAULT_VERSION};
use crate::error::{ChartError, Result};
use crate::notes::table::{is_string_code, CHART_BEGIN_CODE};
use crate::notes::{Dialect, NoteType, NoteTypeTable};

pub use spike::{
    check_spike, spike_code, CrossfadeOutcome, CrossfadeWindow, SpikeClassifier, SpikeRule,
    SpikeVerdict, WindowedCrossfade,
};

/// Shortest note length either game accepts, in measures
pub const MIN_NOTE_LENGTH: f32 = 1.0 / 32.0;

/// Summary of a migration run
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Entries dropped because the source or target dialect has no code for them
    pub dropped: Vec<ChartError>,
    /// Windows skipped by the spike check because of overlapping lanes
    pub overlaps: Vec<ChartError>,
    /// Crossfades folded into the previous one
    pub merged: usize,
    /// Crossfades rewritten to spikes
    pub spikes: usize,
    /// A chart begin marker was added
    pub chart_begin_inserted: bool,
}

impl MigrationReport {
    /// All non-fatal diagnostics, dropped entries first
    pub fn diagnostics(&self) -> impl Iterator<Item = &ChartError> {
        self.dropped.iter().chain(self.overlaps.iter())
    }

    pub fn has_warnings(&self) -> bool {
        !self.dropped.is_empty() || !self.overlaps.is_empty()
    }
}

/// A migrated container together with what happened along the way
#[derive(Debug)]
pub struct Migration {
    pub container: Container,
    pub report: MigrationReport,
}

/// Migrate a decoded chart between dialects
///
/// # Arguments
/// * `source` - Decoded chart in the `from` dialect
/// * `from` - Dialect the source was written in
/// * `to` - Dialect to produce
///
/// # Returns
/// The migrated container (version 2, fresh checksum, same string blob) and
/// a report of merges, spikes and dropped entries.
///
/// # Errors
/// * `InvalidArgument` - `from` and `to` are the same dialect
/// * `StringPointerOutOfRange` - a text entry points outside the string blob
pub fn migrate(source: &Container, from: Dialect, to: Dialect) -> Result<Migration> {
    if from == to {
        return Err(ChartError::InvalidArgument {
            reason: format!("source and target dialect are both {}", from),
        });
    }

    info!("Migrating {} chart to {}", from, to);

    let source_table = NoteTypeTable::for_dialect(from);
    let target_table = NoteTypeTable::for_dialect(to);
    let blob = StringBlob::from_bytes(source.string_blob.clone());
    let source_count = source.entries.len();

    let upgrading = to == Dialect::Djh2;
    let mut has_chart_begin = source
        .entries
        .iter()
        .any(|entry| entry.note_type == CHART_BEGIN_CODE);

    let mut report = MigrationReport::default();
    let mut classifier = SpikeClassifier::new();
    let mut output: Vec<Entry> = Vec::with_capacity(source_count + 1);
    let mut string_slots: Vec<usize> = Vec::new();

    for (index, entry) in source.entries.iter().enumerate() {
        if is_string_code(entry.note_type) {
            let offset = blob.check_offset(relative_pointer(entry.aux, source_count))?;
            string_slots.push(output.len());
            output.push(Entry {
                aux: offset as u32,
                ..*entry
            });
            continue;
        }

        let Some(note_type) = source_table.note_type(entry.note_type) else {
            drop_entry(&mut report, entry.note_type, index);
            continue;
        };

        if note_type == NoteType::ChartBegin && !upgrading {
            debug!("Dropping chart begin marker at entry {}", index);
            continue;
        }

        let target_type = if upgrading {
            note_type
        } else {
            note_type.without_spike()
        };
        let Some(code) = target_table.code(target_type) else {
            drop_entry(&mut report, entry.note_type, index);
            continue;
        };

        let mut migrated = Entry {
            note_type: code,
            ..*entry
        };
        if target_type.is_hold_less() {
            migrated.length = MIN_NOTE_LENGTH;
        }

        if upgrading && !has_chart_begin && migrated.start > 0.0 {
            output.push(Entry::new(0.0, CHART_BEGIN_CODE, 0.0, 0));
            has_chart_begin = true;
            report.chart_begin_inserted = true;
            debug!("Inserted chart begin marker before entry {}", index);
        }

        match (from, target_type) {
            (Dialect::Djh1, NoteType::Crossfade(lane)) => {
                match classifier.feed(&mut output, migrated, lane) {
                    CrossfadeOutcome::Merged { into } => {
                        report.merged += 1;
                        debug!("Merged crossfade at {} into entry {}", migrated.start, into);
                    }
                    CrossfadeOutcome::Spiked {
                        index: spiked,
                        code,
                        rule,
                    } => {
                        report.spikes += 1;
                        debug!("Entry {} is a spike ({:?} rule), code {}", spiked, rule, code);
                    }
                    CrossfadeOutcome::Overlap { start } => {
                        let err = ChartError::OverlappingCrossfades { start };
                        warn!("{}", err);
                        report.overlaps.push(err);
                    }
                    CrossfadeOutcome::Kept => {}
                }
            }
            _ => output.push(migrated),
        }
    }

    let final_count = output.len();
    for slot in string_slots {
        if let Some(entry) = output.get_mut(slot) {
            entry.aux = on_disk_pointer(entry.aux, final_count);
        }
    }

    info!(
        "Migrated {} entries to {} ({} merged, {} spikes, {} dropped)",
        source_count,
        final_count,
        report.merged,
        report.spikes,
        report.dropped.len()
    );

    Ok(Migration {
        container: Container::new(DEFAULT_VERSION, output, source.string_blob.clone()),
        report,
    })
}

fn drop_entry(report: &mut MigrationReport, code: u32, index: usize) {
    let err = ChartError::UnknownNoteType { code, index };
    warn!("{}, dropping", err);
    report.dropped.push(err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const AUTHOR: u32 = 0x0AFF_FFFF;

    fn djh1(entries: Vec<Entry>, blob: &[u8]) -> Container {
        Container::new(1, entries, blob.to_vec())
    }

    fn codes(container: &Container) -> Vec<u32> {
        container.entries.iter().map(|e| e.note_type).collect()
    }

    #[test]
    fn test_same_dialect_is_rejected() {
        let err = migrate(&djh1(Vec::new(), b""), Dialect::Djh1, Dialect::Djh1).unwrap_err();
        assert_eq!(err.error_code(), "ARGUMENT_ERROR");
    }

    #[test]
    fn test_upgrade_inserts_chart_begin_once() {
        let source = djh1(
            vec![
                Entry::new(0.0, 0x0B00_0001, 0.0, 4),
                Entry::new(1.0, 0, 0.0, 0),
                Entry::new(2.0, 1, 0.0, 0),
            ],
            b"",
        );
        let migration = migrate(&source, Dialect::Djh1, Dialect::Djh2).unwrap();

        assert_eq!(
            codes(&migration.container),
            vec![0x0B00_0001, CHART_BEGIN_CODE, 0, 1]
        );
        assert_eq!(migration.container.entries[1], Entry::new(0.0, CHART_BEGIN_CODE, 0.0, 0));
        assert!(migration.report.chart_begin_inserted);
    }

    #[test]
    fn test_upgrade_keeps_existing_chart_begin() {
        let source = djh1(
            vec![
                Entry::new(0.0, CHART_BEGIN_CODE, 0.0, 0),
                Entry::new(1.0, 2, 0.0, 0),
            ],
            b"",
        );
        let migration = migrate(&source, Dialect::Djh1, Dialect::Djh2).unwrap();
        assert_eq!(codes(&migration.container), vec![CHART_BEGIN_CODE, 2]);
        assert!(!migration.report.chart_begin_inserted);
    }

    #[test]
    fn test_downgrade_drops_chart_begin_and_unspikes() {
        let source = Container::new(
            2,
            vec![
                Entry::new(0.0, CHART_BEGIN_CODE, 0.0, 0),
                Entry::new(1.0, 27, 0.03125, 0),
                Entry::new(1.5, 28, 0.03125, 0),
                Entry::new(2.0, 29, 0.03125, 0),
                Entry::new(3.0, 20, 1.0, 0),
            ],
            Vec::new(),
        );
        let migration = migrate(&source, Dialect::Djh2, Dialect::Djh1).unwrap();
        assert_eq!(codes(&migration.container), vec![11, 9, 10, 48]);
        assert!(!migration.report.has_warnings());
    }

    #[test]
    fn test_zone_codes_are_remapped() {
        let source = djh1(
            vec![
                Entry::new(0.0, 48, 1.0, 0),
                Entry::new(0.0, 49, 1.0, 0),
                Entry::new(0.0, 50, 1.0, 0),
                Entry::new(0.0, 51, 1.0, 0),
            ],
            b"",
        );
        let migration = migrate(&source, Dialect::Djh1, Dialect::Djh2).unwrap();
        assert_eq!(codes(&migration.container), vec![20, 21, 22, 23]);
    }

    #[test]
    fn test_holds_are_shortened() {
        let source = djh1(
            vec![
                Entry::new(0.0, 3, 0.5, 0),
                Entry::new(0.0, 7, 0.5, 0),
            ],
            b"",
        );
        let migration = migrate(&source, Dialect::Djh1, Dialect::Djh2).unwrap();
        assert_eq!(migration.container.entries[0].length, MIN_NOTE_LENGTH);
        // Any-direction scratches keep their length
        assert_eq!(migration.container.entries[1].length, 0.5);
    }

    #[test]
    fn test_unknown_codes_are_dropped() {
        let source = djh1(
            vec![
                Entry::new(0.0, 0, 0.0, 0),
                Entry::new(0.0, 99, 0.0, 0),
                Entry::new(0.0, 44, 0.0625, 0),
                Entry::new(0.0, 1, 0.0, 0),
            ],
            b"",
        );
        let migration = migrate(&source, Dialect::Djh1, Dialect::Djh2).unwrap();

        assert_eq!(codes(&migration.container), vec![0, 1]);
        assert_eq!(migration.report.dropped.len(), 2);
        assert!(matches!(
            migration.report.dropped[0],
            ChartError::UnknownNoteType { code: 99, index: 1 }
        ));
        assert!(migration.report.diagnostics().all(|d| !d.is_fatal()));
    }

    #[test]
    fn test_string_pointers_follow_entry_count() {
        // Two entries on disk: pointer 32 is offset 0 of the blob
        let source = djh1(
            vec![
                Entry::new(0.0, AUTHOR, 0.0, 32),
                Entry::new(1.0, 2, 0.0, 0),
            ],
            b"DJ\0",
        );
        let migration = migrate(&source, Dialect::Djh1, Dialect::Djh2).unwrap();

        // Chart begin was added, so three entries now
        let container = &migration.container;
        assert_eq!(container.entries.len(), 3);
        assert_eq!(container.entries[0].aux, 48);
        assert_eq!(container.string_blob, b"DJ\0".to_vec());
        let blob = StringBlob::from_bytes(container.string_blob.clone());
        assert_eq!(blob.resolve(relative_pointer(48, 3)).unwrap(), "DJ");
    }

    #[test]
    fn test_bad_string_pointer_is_fatal() {
        let source = djh1(vec![Entry::new(0.0, AUTHOR, 0.0, 100)], b"DJ\0");
        let err = migrate(&source, Dialect::Djh1, Dialect::Djh2).unwrap_err();
        assert_eq!(err.error_code(), "RANGE_ERROR");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_upgrade_classifies_spikes() {
        let source = djh1(
            vec![
                Entry::new(0.0, 11, 1.0, 0),
                Entry::new(1.0, 9, 0.03125, 0),
                Entry::new(1.5, 11, 1.0, 0),
            ],
            b"",
        );
        let migration = migrate(&source, Dialect::Djh1, Dialect::Djh2).unwrap();

        // ChartBegin lands before the second crossfade
        assert_eq!(
            codes(&migration.container),
            vec![11, CHART_BEGIN_CODE, 28, 11]
        );
        assert_eq!(migration.report.spikes, 1);
    }

    #[test]
    fn test_downgrade_skips_classifier() {
        let source = Container::new(
            2,
            vec![
                Entry::new(0.0, 11, 1.0, 0),
                Entry::new(1.0, 11, 0.5, 0),
            ],
            Vec::new(),
        );
        let migration = migrate(&source, Dialect::Djh2, Dialect::Djh1).unwrap();
        assert_eq!(migration.container.entries.len(), 2);
        assert_eq!(migration.report.merged, 0);
    }

    #[test]
    fn test_output_is_version_two_with_valid_checksum() {
        let source = djh1(vec![Entry::new(0.0, 15, 2.0, 0)], b"");
        let migration = migrate(&source, Dialect::Djh1, Dialect::Djh2).unwrap();
        assert_eq!(migration.container.version, DEFAULT_VERSION);
        assert!(migration.container.verify_checksum());
    }
}
