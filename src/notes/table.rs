//! Note type code tables
//!
//! One immutable row per known note type with its code in each dialect.
//! Lookups by code go through hash indexes built once on first use.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::{Deck, Dialect, Lane, NoteType, TextKind, Turntable};

/// One row of the table: canonical type, DJH1 code, DJH2 code
type Row = (NoteType, Option<u32>, Option<u32>);

const fn both(note_type: NoteType, code: u32) -> Row {
    (note_type, Some(code), Some(code))
}

pub const AUTHOR_CODE: u32 = 0x0AFF_FFFF;
pub const SECTION_CODE: u32 = 0x09FF_FFFF;
pub const LABEL_CODE: u32 = 0x0B00_0000;
pub const BEAT_LENGTH_CODE: u32 = 0x0B00_0001;
pub const TEMPO_CODE: u32 = 0x0B00_0002;
pub const CHART_BEGIN_CODE: u32 = 0xFFFF_FFFF;
pub const FX_FILTER_CODE: u32 = 0x05FF_FFFF;
pub const EFFECT_BASE_CODE: u32 = 0x0600_0000;

static ROWS: &[Row] = &[
    both(NoteType::Tap(Deck::Green), 0),
    both(NoteType::Tap(Deck::Blue), 1),
    both(NoteType::Tap(Deck::Red), 2),
    both(NoteType::ScratchUp(Turntable::Green), 3),
    both(NoteType::ScratchUp(Turntable::Blue), 4),
    both(NoteType::ScratchDown(Turntable::Green), 5),
    both(NoteType::ScratchDown(Turntable::Blue), 6),
    both(NoteType::ScratchAny(Turntable::Green), 7),
    both(NoteType::ScratchAny(Turntable::Blue), 8),
    both(NoteType::Crossfade(Lane::Right), 9),
    both(NoteType::Crossfade(Lane::Center), 10),
    both(NoteType::Crossfade(Lane::Left), 11),
    both(NoteType::Effects(Turntable::Green), 12),
    both(NoteType::Effects(Turntable::Blue), 13),
    both(NoteType::Reserved(14), 14),
    both(NoteType::Euphoria, 15),
    both(NoteType::FreestyleSamples, 16),
    (NoteType::ScratchZone(Turntable::Green), Some(48), Some(20)),
    (NoteType::ScratchZone(Turntable::Blue), Some(49), Some(21)),
    (NoteType::AllLanesEffects, Some(50), Some(22)),
    (NoteType::ForcedCrossfadeZone, Some(51), Some(23)),
    (NoteType::ChunkRemix, None, Some(26)),
    (NoteType::Spike(Lane::Left), None, Some(27)),
    (NoteType::Spike(Lane::Right), None, Some(28)),
    (NoteType::Spike(Lane::Center), None, Some(29)),
    (NoteType::TrackEnd(0), Some(44), None),
    (NoteType::TrackEnd(1), Some(45), None),
    both(NoteType::ChartBegin, CHART_BEGIN_CODE),
    both(NoteType::FxFilter, FX_FILTER_CODE),
    both(NoteType::Effect(0), EFFECT_BASE_CODE),
    both(NoteType::Effect(1), EFFECT_BASE_CODE + 1),
    both(NoteType::Effect(2), EFFECT_BASE_CODE + 2),
    both(NoteType::Effect(3), EFFECT_BASE_CODE + 3),
    both(NoteType::Effect(4), EFFECT_BASE_CODE + 4),
    both(NoteType::Effect(5), EFFECT_BASE_CODE + 5),
    both(NoteType::Effect(6), EFFECT_BASE_CODE + 6),
    both(NoteType::Effect(7), EFFECT_BASE_CODE + 7),
    both(NoteType::Effect(8), EFFECT_BASE_CODE + 8),
    both(NoteType::Effect(9), EFFECT_BASE_CODE + 9),
    both(NoteType::BeatLength, BEAT_LENGTH_CODE),
    both(NoteType::Tempo, TEMPO_CODE),
    both(NoteType::Text(TextKind::Author), AUTHOR_CODE),
    both(NoteType::Text(TextKind::Section), SECTION_CODE),
    both(NoteType::Text(TextKind::Label), LABEL_CODE),
];

/// Symbolic names used by the tabular form, in their fixed order
static SYMBOLS: &[(&str, u32)] = &[
    ("AUTHOR", AUTHOR_CODE),
    ("SECTION", SECTION_CODE),
    ("CHART_BPM", TEMPO_CODE),
    ("BEAT_LENGTH", BEAT_LENGTH_CODE),
    ("CHART_BEGIN", CHART_BEGIN_CODE),
    ("FX_FILTER", FX_FILTER_CODE),
    ("FX_BEATROLL", EFFECT_BASE_CODE),
    ("FX_BITREDUCE", EFFECT_BASE_CODE + 1),
    ("FX_WAHWAH", EFFECT_BASE_CODE + 2),
    ("FX_RINGMOD", EFFECT_BASE_CODE + 3),
    ("FX_STUTTER", EFFECT_BASE_CODE + 4),
    ("FX_FLANGER", EFFECT_BASE_CODE + 5),
    ("FX_ROBOT", EFFECT_BASE_CODE + 6),
    ("FX_ADV_BEATROLL", EFFECT_BASE_CODE + 7),
    ("FX_DELAY", EFFECT_BASE_CODE + 9),
];

/// Immutable code lookup for one dialect
#[derive(Debug)]
pub struct NoteTypeTable {
    dialect: Dialect,
    by_code: HashMap<u32, NoteType>,
    by_type: HashMap<NoteType, u32>,
}

impl NoteTypeTable {
    fn build(dialect: Dialect) -> Self {
        let mut by_code = HashMap::new();
        let mut by_type = HashMap::new();
        for &(note_type, djh1, djh2) in ROWS {
            let code = match dialect {
                Dialect::Djh1 => djh1,
                Dialect::Djh2 => djh2,
            };
            if let Some(code) = code {
                by_code.insert(code, note_type);
                by_type.insert(note_type, code);
            }
        }
        Self {
            dialect,
            by_code,
            by_type,
        }
    }

    /// Shared table for a dialect
    pub fn for_dialect(dialect: Dialect) -> &'static NoteTypeTable {
        static DJH1: OnceLock<NoteTypeTable> = OnceLock::new();
        static DJH2: OnceLock<NoteTypeTable> = OnceLock::new();
        match dialect {
            Dialect::Djh1 => DJH1.get_or_init(|| Self::build(Dialect::Djh1)),
            Dialect::Djh2 => DJH2.get_or_init(|| Self::build(Dialect::Djh2)),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Canonical type for a code, if this dialect recognizes it
    pub fn note_type(&self, code: u32) -> Option<NoteType> {
        self.by_code.get(&code).copied()
    }

    /// Code for a canonical type, if this dialect can express it
    pub fn code(&self, note_type: NoteType) -> Option<u32> {
        self.by_type.get(&note_type).copied()
    }

    pub fn recognizes(&self, code: u32) -> bool {
        self.by_code.contains_key(&code)
    }
}

/// Codes whose auxiliary field is a string pointer, in any dialect
pub fn is_string_code(code: u32) -> bool {
    matches!(code, AUTHOR_CODE | SECTION_CODE | LABEL_CODE)
}

/// Symbolic name for a code, if it has one
pub fn symbol_for_code(code: u32) -> Option<&'static str> {
    SYMBOLS
        .iter()
        .find(|(_, symbol_code)| *symbol_code == code)
        .map(|(name, _)| *name)
}

/// Code for a symbolic name; matching ignores case and surrounding spaces
pub fn code_for_symbol(name: &str) -> Option<u32> {
    let name = name.trim();
    SYMBOLS
        .iter()
        .find(|(symbol, _)| symbol.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}
