//! Canonical note types
//!
//! Both games use the same entry layout but disagree on a handful of codes.
//! [`NoteType`] names every event either game is known to use; the
//! per-dialect code tables live in [`table`].

pub mod table;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use table::{code_for_symbol, symbol_for_code, NoteTypeTable};

/// One of the two binary chart dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// DJ Hero 1 charts (`.fsgmub`): no spikes, no chart begin marker
    Djh1,
    /// DJ Hero 2 charts (`.xmk`): adds spike variants and chunk remixes
    Djh2,
}

impl Dialect {
    /// Conventional file extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Dialect::Djh1 => "fsgmub",
            Dialect::Djh2 => "xmk",
        }
    }

    /// Guess the dialect from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "fsgmub" => Some(Dialect::Djh1),
            "xmk" => Some(Dialect::Djh2),
            _ => None,
        }
    }

    /// The other dialect
    pub fn other(&self) -> Self {
        match self {
            Dialect::Djh1 => Dialect::Djh2,
            Dialect::Djh2 => Dialect::Djh1,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Djh1 => write!(f, "DJH1"),
            Dialect::Djh2 => write!(f, "DJH2"),
        }
    }
}

/// Crossfader position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Green side
    Left,
    Center,
    /// Blue side
    Right,
}

impl Lane {
    pub fn is_side(&self) -> bool {
        matches!(self, Lane::Left | Lane::Right)
    }
}

/// Tap lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deck {
    Green,
    Blue,
    Red,
}

/// Scratchable turntable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turntable {
    Green,
    Blue,
}

/// Text-bearing metadata entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    Author,
    Section,
    Label,
}

/// How an entry's auxiliary field is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxKind {
    Integer,
    Float,
    StringPointer,
}

/// Canonical, dialect-independent note type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteType {
    Tap(Deck),
    ScratchUp(Turntable),
    ScratchDown(Turntable),
    ScratchAny(Turntable),
    Crossfade(Lane),
    /// Quick flick to a lane and back; DJH2 only
    Spike(Lane),
    Effects(Turntable),
    Euphoria,
    FreestyleSamples,
    ScratchZone(Turntable),
    AllLanesEffects,
    ForcedCrossfadeZone,
    /// DJH2 battle chunk boundary
    ChunkRemix,
    /// DJH1 end-of-track markers (44, 45)
    TrackEnd(u8),
    ChartBegin,
    FxFilter,
    /// Named effect slot 0..=9
    Effect(u8),
    BeatLength,
    Tempo,
    Text(TextKind),
    /// Used by the games with no known meaning; carried through unchanged
    Reserved(u32),
}

impl NoteType {
    /// Interpretation of the auxiliary field for this type
    pub fn aux_kind(&self) -> AuxKind {
        match self {
            NoteType::Text(_) => AuxKind::StringPointer,
            NoteType::Tempo => AuxKind::Float,
            _ => AuxKind::Integer,
        }
    }

    /// Taps and directional scratches; these carry no meaningful hold length
    pub fn is_hold_less(&self) -> bool {
        matches!(
            self,
            NoteType::Tap(_) | NoteType::ScratchUp(_) | NoteType::ScratchDown(_)
        )
    }

    /// Spikes fold back into plain crossfades in dialects without them
    pub fn without_spike(self) -> Self {
        match self {
            NoteType::Spike(lane) => NoteType::Crossfade(lane),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(Dialect::from_path(Path::new("a/DJ_Expert.xmk")), Some(Dialect::Djh2));
        assert_eq!(Dialect::from_path(Path::new("chart.FSGMUB")), Some(Dialect::Djh1));
        assert_eq!(Dialect::from_path(Path::new("chart.csv")), None);
        assert_eq!(Dialect::from_path(Path::new("chart")), None);
    }

    #[test]
    fn test_aux_kinds() {
        assert_eq!(NoteType::Text(TextKind::Author).aux_kind(), AuxKind::StringPointer);
        assert_eq!(NoteType::Tempo.aux_kind(), AuxKind::Float);
        assert_eq!(NoteType::BeatLength.aux_kind(), AuxKind::Integer);
    }

    #[test]
    fn test_without_spike() {
        assert_eq!(NoteType::Spike(Lane::Left).without_spike(), NoteType::Crossfade(Lane::Left));
        assert_eq!(NoteType::Euphoria.without_spike(), NoteType::Euphoria);
    }

    #[test]
    fn test_hold_less() {
        assert!(NoteType::Tap(Deck::Red).is_hold_less());
        assert!(NoteType::ScratchDown(Turntable::Blue).is_hold_less());
        assert!(!NoteType::ScratchAny(Turntable::Blue).is_hold_less());
        assert!(!NoteType::Crossfade(Lane::Center).is_hold_less());
    }
}
