//! Stable k-way merge of per-lane entry sequences
//!
//! Each lane is assumed to be in time order already. The merge keeps one
//! cursor per lane in a min-heap keyed on `(start, lane)`, so equal start
//! times come out in input lane order and, within a lane, in input order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::container::Entry;

/// Anything with a start time in measures
pub trait Timed {
    fn start(&self) -> f32;
}

impl Timed for Entry {
    fn start(&self) -> f32 {
        self.start
    }
}

impl<T> Timed for (f32, T) {
    fn start(&self) -> f32 {
        self.0
    }
}

struct Head {
    start: f32,
    lane: usize,
}

// BinaryHeap is a max-heap, so the ordering is reversed to pop the
// earliest (start, lane) first.
impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Head {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .start
            .total_cmp(&self.start)
            .then_with(|| other.lane.cmp(&self.lane))
    }
}

/// Merge lanes into one sequence ordered by start time
///
/// Ties go to the lane that comes first in `lanes`.
pub fn merge_lanes<T: Timed>(lanes: Vec<Vec<T>>) -> Vec<T> {
    let total = lanes.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);

    let mut cursors: Vec<std::iter::Peekable<std::vec::IntoIter<T>>> = lanes
        .into_iter()
        .map(|lane| lane.into_iter().peekable())
        .collect();

    let mut heap = BinaryHeap::with_capacity(cursors.len());
    for (lane, cursor) in cursors.iter_mut().enumerate() {
        if let Some(first) = cursor.peek() {
            heap.push(Head {
                start: first.start(),
                lane,
            });
        }
    }

    while let Some(Head { lane, .. }) = heap.pop() {
        let cursor = &mut cursors[lane];
        if let Some(item) = cursor.next() {
            merged.push(item);
        }
        if let Some(next) = cursor.peek() {
            heap.push(Head {
                start: next.start(),
                lane,
            });
        }
    }

    merged
}
