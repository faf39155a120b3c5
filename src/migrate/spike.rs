//! Crossfade spike classification
//!
//! DJH2 tells a quick flick of the crossfader ("spike") apart from a
//! sustained crossfade. DJH1 charts only carry plain crossfades, so when
//! upgrading we look at every three consecutive crossfades and decide from
//! their lanes and the middle one's length whether the middle is a spike.

use std::collections::VecDeque;

use crate::container::Entry;
use crate::notes::Lane;

/// Longest crossfade that can still be a spike, in measures
pub const SPIKE_MAX_LENGTH: f32 = 1.0 / 16.0;

/// Number of crossfades inspected at once
pub const WINDOW_SIZE: usize = 3;

/// DJH2 spike code for a crossfade lane
pub fn spike_code(lane: Lane) -> u32 {
    match lane {
        Lane::Left => 27,
        Lane::Right => 28,
        Lane::Center => 29,
    }
}

/// A crossfade held in the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowedCrossfade {
    /// Position of the entry in the output sequence
    pub index: usize,
    pub lane: Lane,
    pub start: f32,
    pub length: f32,
    /// Already rewritten to a spike code
    pub spiked: bool,
}

impl WindowedCrossfade {
    pub fn new(index: usize, lane: Lane, start: f32, length: f32) -> Self {
        Self {
            index,
            lane,
            start,
            length,
            spiked: false,
        }
    }

    fn is_center_spike(&self) -> bool {
        self.spiked && self.lane == Lane::Center
    }
}

/// Fixed-capacity window of the most recent crossfades, newest first
#[derive(Debug, Clone, Default)]
pub struct CrossfadeWindow {
    slots: VecDeque<WindowedCrossfade>,
}

impl CrossfadeWindow {
    pub fn new() -> Self {
        Self {
            slots: VecDeque::with_capacity(WINDOW_SIZE),
        }
    }

    /// Build a window from slots listed newest first
    pub fn from_newest_first(slots: impl IntoIterator<Item = WindowedCrossfade>) -> Self {
        let mut window = Self::new();
        for slot in slots.into_iter().take(WINDOW_SIZE) {
            window.slots.push_back(slot);
        }
        window
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= WINDOW_SIZE
    }

    /// Add a crossfade as the newest slot
    pub fn push(&mut self, slot: WindowedCrossfade) {
        self.slots.push_front(slot);
    }

    pub fn newest(&self) -> Option<&WindowedCrossfade> {
        self.slots.front()
    }

    pub fn newest_mut(&mut self) -> Option<&mut WindowedCrossfade> {
        self.slots.front_mut()
    }

    pub fn middle(&self) -> Option<&WindowedCrossfade> {
        self.slots.get(1)
    }

    pub fn middle_mut(&mut self) -> Option<&mut WindowedCrossfade> {
        self.slots.get_mut(1)
    }

    pub fn oldest(&self) -> Option<&WindowedCrossfade> {
        self.slots.get(WINDOW_SIZE - 1)
    }

    pub fn pop_oldest(&mut self) -> Option<WindowedCrossfade> {
        self.slots.pop_back()
    }
}

/// Which geometric rule accepted a spike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpikeRule {
    /// Oldest and newest crossfades share a lane
    Center,
    /// Middle crossfade sits on a side lane
    Edge,
}

/// Outcome of inspecting a full window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpikeVerdict {
    /// Middle crossfade is a spike
    Spike(SpikeRule),
    /// Middle crossfade stays a plain crossfade
    Sustained,
    /// Adjacent window entries share a lane; the window is skipped
    Overlap,
}

/// Decide whether the middle crossfade of a full window is a spike
///
/// Windows holding fewer than three crossfades are always `Sustained`.
pub fn check_spike(window: &CrossfadeWindow) -> SpikeVerdict {
    let (Some(newest), Some(middle), Some(oldest)) =
        (window.newest(), window.middle(), window.oldest())
    else {
        return SpikeVerdict::Sustained;
    };

    if newest.lane == middle.lane || middle.lane == oldest.lane {
        return SpikeVerdict::Overlap;
    }

    if middle.length > SPIKE_MAX_LENGTH {
        return SpikeVerdict::Sustained;
    }

    if !oldest.spiked && oldest.lane == newest.lane {
        return SpikeVerdict::Spike(SpikeRule::Center);
    }

    if middle.lane.is_side() && !oldest.is_center_spike() {
        return SpikeVerdict::Spike(SpikeRule::Edge);
    }

    SpikeVerdict::Sustained
}

/// What happened to one crossfade fed to the classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrossfadeOutcome {
    /// Folded into the previous crossfade, which now ends where this one did
    Merged { into: usize },
    /// Appended; no spike decision was made
    Kept,
    /// Appended, and the entry at `index` was rewritten to `code`
    Spiked {
        index: usize,
        code: u32,
        rule: SpikeRule,
    },
    /// Appended, but the window around `start` had overlapping lanes
    Overlap { start: f32 },
}

/// Streaming spike classifier over the crossfades of one chart
#[derive(Debug, Default)]
pub struct SpikeClassifier {
    window: CrossfadeWindow,
}

impl SpikeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(&self) -> &CrossfadeWindow {
        &self.window
    }

    /// Feed the next crossfade in file order
    ///
    /// The entry is either merged into the previous crossfade already in
    /// `output` or appended to it. Spike rewrites are applied to `output`
    /// in place.
    pub fn feed(&mut self, output: &mut Vec<Entry>, entry: Entry, lane: Lane) -> CrossfadeOutcome {
        if let Some(newest) = self.window.newest_mut() {
            if newest.lane == lane {
                let length = (f64::from(entry.start) + f64::from(entry.length)
                    - f64::from(newest.start)) as f32;
                newest.length = length;
                if let Some(previous) = output.get_mut(newest.index) {
                    previous.length = length;
                }
                return CrossfadeOutcome::Merged { into: newest.index };
            }
        }

        let index = output.len();
        output.push(entry);
        self.window
            .push(WindowedCrossfade::new(index, lane, entry.start, entry.length));

        if !self.window.is_full() {
            return CrossfadeOutcome::Kept;
        }

        let outcome = match check_spike(&self.window) {
            SpikeVerdict::Spike(rule) => self.rewrite_middle(output, rule),
            SpikeVerdict::Overlap => CrossfadeOutcome::Overlap {
                start: self.window.middle().map_or(entry.start, |m| m.start),
            },
            SpikeVerdict::Sustained => CrossfadeOutcome::Kept,
        };
        self.window.pop_oldest();
        outcome
    }

    fn rewrite_middle(&mut self, output: &mut [Entry], rule: SpikeRule) -> CrossfadeOutcome {
        let Some(middle) = self.window.middle_mut() else {
            return CrossfadeOutcome::Kept;
        };
        let code = spike_code(middle.lane);
        middle.spiked = true;
        if let Some(target) = output.get_mut(middle.index) {
            target.note_type = code;
        }
        CrossfadeOutcome::Spiked {
            index: middle.index,
            code,
            rule,
        }
    }
}
