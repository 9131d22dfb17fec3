//! Beat-slot content: which lanes a slot fills and whether it is a hold.

pub mod grid;

pub use grid::BeatGrid;

use song_schema::LANE_COUNT;

/// One or two distinct lanes, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneSet {
    lanes: [u8; 2],
    len: u8,
}

impl LaneSet {
    pub fn single(lane: u8) -> Self {
        debug_assert!((lane as usize) < LANE_COUNT);
        Self {
            lanes: [lane, lane],
            len: 1,
        }
    }

    /// A two-lane chord; `None` when both lanes are the same.
    pub fn chord(first: u8, second: u8) -> Option<Self> {
        if first == second {
            return None;
        }
        Some(Self {
            lanes: [first, second],
            len: 2,
        })
    }

    /// Normalizes an authored slot: out-of-range lanes are skipped, duplicates
    /// removed, and only the first two distinct lanes kept.
    pub fn from_slot(slot: &[u8]) -> Option<Self> {
        let mut valid = slot.iter().copied().filter(|lane| (*lane as usize) < LANE_COUNT);
        let first = valid.next()?;
        match valid.find(|lane| *lane != first) {
            Some(second) => Self::chord(first, second),
            None => Some(Self::single(first)),
        }
    }

    pub fn lanes(&self) -> &[u8] {
        &self.lanes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_chord(&self) -> bool {
        self.len == 2
    }

    pub fn contains(&self, lane: u8) -> bool {
        self.lanes().contains(&lane)
    }
}

/// The content of one beat-slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    pub lanes: LaneSet,
    /// Hold length in beats; 0 for tap tiles.
    pub hold_beats: f64,
}

impl BeatEvent {
    pub fn tap(lanes: LaneSet) -> Self {
        Self {
            lanes,
            hold_beats: 0.0,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.hold_beats > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authored_slots_are_deduplicated_and_capped() {
        assert_eq!(LaneSet::from_slot(&[2, 2, 1, 3]).unwrap().lanes(), &[2, 1]);
        assert_eq!(LaneSet::from_slot(&[3, 3]).unwrap().lanes(), &[3]);
        assert_eq!(LaneSet::from_slot(&[7, 0]).unwrap().lanes(), &[0]);
        assert!(LaneSet::from_slot(&[]).is_none());
        assert!(LaneSet::from_slot(&[9]).is_none());
    }

    #[test]
    fn chord_requires_distinct_lanes() {
        assert!(LaneSet::chord(1, 1).is_none());
        let chord = LaneSet::chord(0, 3).unwrap();
        assert!(chord.is_chord());
        assert!(chord.contains(3));
        assert!(!chord.contains(1));
    }
}
