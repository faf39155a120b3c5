//! `.chart` text form
//!
//! A binary chart is fanned out into a handful of note sections that
//! community chart editors understand, one section per physical lane (or
//! per difficulty for guitar charts). Each section maps up to seven note
//! slots onto fixed binary codes. Importing reads the sections back and
//! fans them in with [`merge_lanes`].
//!
//! Positions are written in ticks at 192 per beat, four beats per measure.

pub mod merge;

use std::fmt::Write as _;

use clap::ValueEnum;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::container::{Container, Entry, DEFAULT_VERSION};
use crate::error::ChartError;

pub use merge::{merge_lanes, Timed};

/// Ticks per beat written to the `[Song]` section
pub const RESOLUTION: u32 = 192;

/// Ticks per measure
pub const TICKS_PER_MEASURE: f64 = (RESOLUTION * 4) as f64;

/// DJH1 end-of-track markers; appended on DJ import, never exported
pub const TRACK_END_CODES: [u32; 2] = [44, 45];

const TRACK_END_START: f32 = 4.0;
const TRACK_END_LENGTH: f32 = 0.0625;

/// Slot written as `S 2 <length>` in guitar sections
const STARPOWER_SLOT: usize = 6;

const DJ_HEADER: &str = r#"[Song]
{
  Offset = 0
  Resolution = 192
  Player2 = bass
  Difficulty = 0
  PreviewStart = 0
  PreviewEnd = 0
  Genre = "Turntablism"
  MediaType = "djhero"
}
[SyncTrack]
{
  0 = TS 4
  0 = B 120000
}
[Events]
{
}"#;

const GUITAR_HEADER: &str = r#"[Song]
{
  Offset = 0
  Resolution = 192
  Player2 = bass
  Difficulty = 0
  PreviewStart = 0
  PreviewEnd = 0
  Genre = ""
  MediaType = "djhero_guitar"
}
[SyncTrack]
{
  0 = TS 4
  0 = B 120000
}
[Events]
{
}"#;

/// One note section and the binary code behind each of its slots
#[derive(Debug)]
pub struct Section {
    pub name: &'static str,
    pub slots: &'static [Option<u32>],
}

impl Section {
    fn slot_of(&self, code: u32) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(code))
    }
}

static DJ_SECTIONS: [Section; 4] = [
    // Crossfader, euphoria, red lane
    Section {
        name: "[ExpertSingle]",
        slots: &[Some(11), Some(10), Some(9), Some(15), Some(2)],
    },
    // Green turntable
    Section {
        name: "[ExpertDoubleGuitar]",
        slots: &[Some(7), Some(5), Some(3), Some(48), Some(0)],
    },
    // Blue turntable
    Section {
        name: "[ExpertDoubleBass]",
        slots: &[Some(8), Some(6), Some(4), Some(49), Some(1)],
    },
    // Effects and samples
    Section {
        name: "[ExpertDoubleRhythm]",
        slots: &[Some(12), Some(16), Some(50), Some(13), None],
    },
];

static GUITAR_SECTIONS: [Section; 4] = [
    Section {
        name: "[EasySingle]",
        slots: &[Some(20), Some(21), Some(22), Some(23), Some(24), Some(40), Some(53)],
    },
    Section {
        name: "[MediumSingle]",
        slots: &[Some(25), Some(26), Some(27), Some(28), Some(29), Some(41), Some(54)],
    },
    Section {
        name: "[HardSingle]",
        slots: &[Some(30), Some(31), Some(32), Some(33), Some(34), Some(42), Some(55)],
    },
    Section {
        name: "[ExpertSingle]",
        slots: &[Some(35), Some(36), Some(37), Some(38), Some(39), Some(43), Some(56)],
    },
];

/// Section layout of a chart file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartLayout {
    /// Turntable charts: crossfader, two turntables, effects
    #[default]
    Dj,
    /// DJ Hero guitar charts: one section per difficulty
    Guitar,
}

impl ChartLayout {
    pub fn sections(&self) -> &'static [Section] {
        match self {
            ChartLayout::Dj => &DJ_SECTIONS,
            ChartLayout::Guitar => &GUITAR_SECTIONS,
        }
    }

    /// Fixed `[Song]`, `[SyncTrack]` and `[Events]` preamble
    pub fn header(&self) -> &'static str {
        match self {
            ChartLayout::Dj => DJ_HEADER,
            ChartLayout::Guitar => GUITAR_HEADER,
        }
    }

    /// Shortest length a note gets on import, in measures
    pub fn min_length(&self) -> f64 {
        match self {
            ChartLayout::Dj => 1.0 / 192.0,
            ChartLayout::Guitar => 1.0 / 32.0 + 0.0001,
        }
    }

    /// Highest slot reachable with an `N` line
    fn max_note_slot(&self) -> usize {
        match self {
            ChartLayout::Dj => 4,
            ChartLayout::Guitar => 5,
        }
    }

    /// Length written for an exported note, in measures
    fn export_length(&self, entry: &Entry) -> f64 {
        let length = f64::from(entry.length);
        match self {
            // Taps and directional scratches are zero-length in a chart
            ChartLayout::Dj if entry.note_type <= 6 => 0.0,
            ChartLayout::Guitar if length <= self.min_length() => 0.0,
            _ => length,
        }
    }
}

/// Convert measures to ticks, rounding half to even
pub fn to_ticks(measures: f64) -> i64 {
    (measures * TICKS_PER_MEASURE).round_ties_even() as i64
}

/// Rendered chart text plus entries that had no section
#[derive(Debug)]
pub struct ChartExport {
    pub text: String,
    pub unknown: Vec<ChartError>,
}

/// Fan a binary chart out into `.chart` text
pub fn export_chart(container: &Container, layout: ChartLayout) -> ChartExport {
    let sections = layout.sections();
    let mut lines: Vec<Vec<String>> = vec![Vec::new(); sections.len()];
    let mut unknown = Vec::new();

    for (index, entry) in container.entries.iter().enumerate() {
        let placed = sections
            .iter()
            .enumerate()
            .find_map(|(lane, section)| section.slot_of(entry.note_type).map(|slot| (lane, slot)));

        let Some((lane, slot)) = placed else {
            if !TRACK_END_CODES.contains(&entry.note_type) {
                let err = ChartError::UnknownNoteType {
                    code: entry.note_type,
                    index,
                };
                warn!("{}", err);
                unknown.push(err);
            }
            continue;
        };

        let tick = to_ticks(f64::from(entry.start));
        let length = to_ticks(layout.export_length(entry));
        let line = if layout == ChartLayout::Guitar && slot == STARPOWER_SLOT {
            format!("  {} = S 2 {}", tick, length)
        } else {
            format!("  {} = N {} {}", tick, slot, length)
        };
        lines[lane].push(line);
    }

    let mut text = String::with_capacity(layout.header().len() + container.entries.len() * 16);
    text.push_str(layout.header());
    text.push('\n');
    for (section, notes) in sections.iter().zip(&lines) {
        let _ = writeln!(text, "{}", section.name);
        text.push_str("{\n");
        for note in notes {
            text.push_str(note);
            text.push('\n');
        }
        text.push_str("}\n");
    }

    ChartExport { text, unknown }
}

/// Container read back from `.chart` text
#[derive(Debug)]
pub struct ChartImport {
    pub container: Container,
    /// Lines inside note sections that could not be used
    pub skipped: usize,
}

/// Fan `.chart` sections back into one binary chart
///
/// Sections not in the layout are ignored, as are lines inside a section
/// that are not usable note lines. A section that appears twice replaces
/// its earlier notes.
pub fn import_chart(text: &str, layout: ChartLayout) -> ChartImport {
    let sections = layout.sections();
    let mut lanes: Vec<Vec<Entry>> = vec![Vec::new(); sections.len()];
    let mut current: Option<usize> = None;
    let mut skipped = 0;

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let Some(lane) = current else {
            current = sections.iter().position(|section| section.name == line);
            if let Some(lane) = current {
                lanes[lane].clear();
            }
            continue;
        };

        if line.contains('}') {
            current = None;
            continue;
        }
        if line.is_empty() || line == "{" {
            continue;
        }

        match parse_note_line(line, &sections[lane], layout) {
            Some(entry) => lanes[lane].push(entry),
            None => {
                warn!("Skipping chart line {}: {:?}", line_no + 1, line);
                skipped += 1;
            }
        }
    }

    let mut entries = merge_lanes(lanes);
    if layout == ChartLayout::Dj {
        for code in TRACK_END_CODES {
            entries.push(Entry::new(TRACK_END_START, code, TRACK_END_LENGTH, 0));
        }
    }
    debug!("Imported {} entries from chart", entries.len());

    ChartImport {
        container: Container::new(DEFAULT_VERSION, entries, Vec::new()),
        skipped,
    }
}

/// Parse `<tick> = N <slot> <length>` (or `S 2 <length>` for star power)
fn parse_note_line(line: &str, section: &Section, layout: ChartLayout) -> Option<Entry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [tick, _, kind, slot, length] = fields.as_slice() else {
        return None;
    };

    let slot = match (*kind, layout) {
        ("N", _) => slot
            .parse::<usize>()
            .ok()
            .filter(|slot| *slot <= layout.max_note_slot())?,
        ("S", ChartLayout::Guitar) if *slot == "2" => STARPOWER_SLOT,
        _ => return None,
    };
    let code = section.slots.get(slot).copied().flatten()?;

    let start = tick.parse::<f64>().ok()? / TICKS_PER_MEASURE;
    let length = (length.parse::<f64>().ok()? / TICKS_PER_MEASURE).max(layout.min_length());

    Some(Entry::new(start as f32, code, length as f32, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn section_body<'a>(text: &'a str, name: &str) -> Vec<&'a str> {
        text.lines()
            .skip_while(|line| *line != name)
            .skip(2)
            .take_while(|line| *line != "}")
            .collect()
    }

    #[test_case(0.0, 0)]
    #[test_case(1.0, 768)]
    #[test_case(0.25, 192)]
    #[test_case(1.0 / 1536.0, 0 ; "half tick rounds to even")]
    #[test_case(3.0 / 1536.0, 2 ; "one and a half ticks rounds up")]
    fn test_to_ticks(measures: f64, expected: i64) {
        assert_eq!(to_ticks(measures), expected);
    }

    #[test]
    fn test_dj_export() {
        let container = Container::new(
            2,
            vec![
                Entry::new(0.0, 11, 1.0, 0),
                Entry::new(0.5, 0, 0.03125, 0),
                Entry::new(1.0, 13, 0.25, 0),
                Entry::new(4.0, 44, 0.0625, 0),
            ],
            Vec::new(),
        );
        let export = export_chart(&container, ChartLayout::Dj);

        assert!(export.text.starts_with("[Song]\n{\n  Offset = 0\n"));
        assert!(export.text.contains("MediaType = \"djhero\""));
        assert_eq!(section_body(&export.text, "[ExpertSingle]"), vec!["  0 = N 0 768"]);
        assert_eq!(section_body(&export.text, "[ExpertDoubleGuitar]"), vec!["  384 = N 4 0"]);
        assert!(section_body(&export.text, "[ExpertDoubleBass]").is_empty());
        assert_eq!(section_body(&export.text, "[ExpertDoubleRhythm]"), vec!["  768 = N 3 192"]);
        assert!(export.unknown.is_empty());
        assert!(export.text.ends_with("}\n"));
    }

    #[test]
    fn test_export_reports_unknown_codes() {
        let container = Container::new(
            2,
            vec![Entry::new(0.0, 0x0B00_0002, 0.0, 0), Entry::new(1.0, 45, 0.0, 0)],
            Vec::new(),
        );
        let export = export_chart(&container, ChartLayout::Dj);
        assert_eq!(export.unknown.len(), 1);
        assert!(matches!(
            export.unknown[0],
            ChartError::UnknownNoteType { code: 0x0B00_0002, index: 0 }
        ));
    }

    #[test]
    fn test_guitar_export() {
        let container = Container::new(
            2,
            vec![
                Entry::new(1.0, 35, 0.03125, 0),
                Entry::new(1.0, 56, 2.0, 0),
                Entry::new(2.0, 22, 0.5, 0),
            ],
            Vec::new(),
        );
        let export = export_chart(&container, ChartLayout::Guitar);

        assert!(export.text.contains("MediaType = \"djhero_guitar\""));
        assert_eq!(
            section_body(&export.text, "[ExpertSingle]"),
            vec!["  768 = N 0 0", "  768 = S 2 1536"]
        );
        assert_eq!(section_body(&export.text, "[EasySingle]"), vec!["  1536 = N 2 384"]);
    }

    #[test]
    fn test_dj_import() {
        let text = "\
[Song]
{
  Resolution = 192
}
[ExpertDoubleGuitar]
{
  768 = N 4 0
}
[ExpertSingle]
{
  0 = N 0 768
  768 = N 1 96
}
";
        let import = import_chart(text, ChartLayout::Dj);
        let entries = &import.container.entries;

        let codes: Vec<u32> = entries.iter().map(|e| e.note_type).collect();
        // Ties at 768 keep layout order: [ExpertSingle] before [ExpertDoubleGuitar]
        assert_eq!(codes, vec![11, 10, 0, 44, 45]);
        assert_relative_eq!(entries[2].length, 1.0 / 192.0);
        assert_eq!(entries[3], Entry::new(4.0, 44, 0.0625, 0));
        assert_eq!(import.skipped, 0);
        assert_eq!(import.container.version, 2);
        assert!(import.container.string_blob.is_empty());
    }

    #[test]
    fn test_import_skips_unusable_lines() {
        let text = "\
[ExpertDoubleRhythm]
{
  0 = N 4 0
  0 = N 9 0
  0 = E solo
  oops = N 0 0
  192 = N 0 0
}
";
        let import = import_chart(text, ChartLayout::Dj);
        assert_eq!(import.skipped, 4);
        assert_eq!(import.container.entries[0].note_type, 12);
        assert_eq!(import.container.entries.len(), 3);
    }

    #[test]
    fn test_guitar_import() {
        let text = "\
[HardSingle]
{
  0 = N 5 0
  0 = S 2 768
}
";
        let import = import_chart(text, ChartLayout::Guitar);
        let entries = &import.container.entries;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].note_type, 42);
        assert_relative_eq!(entries[0].length, (1.0 / 32.0 + 0.0001) as f32);
        assert_eq!(entries[1].note_type, 55);
        assert_relative_eq!(entries[1].length, 1.0);
    }

    #[test]
    fn test_export_import_round_trip() {
        let container = Container::new(
            2,
            vec![
                Entry::new(0.0, 11, 1.0, 0),
                Entry::new(0.0, 7, 0.5, 0),
                Entry::new(1.0, 9, 0.5, 0),
                Entry::new(1.5, 16, 0.25, 0),
                Entry::new(TRACK_END_START, 44, TRACK_END_LENGTH, 0),
                Entry::new(TRACK_END_START, 45, TRACK_END_LENGTH, 0),
            ],
            Vec::new(),
        );
        let text = export_chart(&container, ChartLayout::Dj).text;
        let import = import_chart(&text, ChartLayout::Dj);
        assert_eq!(import.container.entries, container.entries);
    }
}
