use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use song_schema::{PatternSlot, LANE_COUNT};

use crate::beat::{BeatEvent, LaneSet};
use crate::rules::Rules;

#[derive(Debug, Clone)]
enum PatternSource {
    Authored(Vec<LaneSet>),
    Generated,
}

/// Answers "what does the next beat-slot contain".
///
/// Authored patterns replay cyclically; without one, slots are drawn from a
/// seeded generator. Either way the sequence depends only on the pattern, the
/// rules and the seed.
#[derive(Debug, Clone)]
pub struct BeatGrid {
    source: PatternSource,
    rng: Pcg32,
    slot_index: u64,

    chord_probability: f64,
    chord_min_gap_slots: u64,
    max_lane_repeat: u32,
    hold_probability: f64,
    hold_min_beats: f64,
    hold_max_beats: f64,
    hold_grace_beats: f64,

    last_chord_slot: Option<u64>,
    last_lane: Option<u8>,
    lane_run: u32,
}

impl BeatGrid {
    pub fn new(pattern: Option<&[PatternSlot]>, rules: &Rules, density: f64) -> Self {
        let authored: Vec<LaneSet> = pattern
            .unwrap_or_default()
            .iter()
            .filter_map(|slot| LaneSet::from_slot(slot))
            .collect();
        let source = if authored.is_empty() {
            PatternSource::Generated
        } else {
            PatternSource::Authored(authored)
        };

        Self {
            source,
            rng: Pcg32::seed_from_u64(rules.seed),
            slot_index: 0,
            chord_probability: (rules.chord_probability * density).clamp(0.0, 1.0),
            chord_min_gap_slots: rules.chord_min_gap_slots as u64,
            max_lane_repeat: rules.max_lane_repeat,
            hold_probability: rules.hold_probability,
            hold_min_beats: rules.hold_min_beats,
            hold_max_beats: rules.hold_max_beats,
            hold_grace_beats: rules.hold_grace_beats,
            last_chord_slot: None,
            last_lane: None,
            lane_run: 0,
        }
    }

    pub fn is_authored(&self) -> bool {
        matches!(self.source, PatternSource::Authored(_))
    }

    /// Number of slots produced so far.
    pub fn slots_emitted(&self) -> u64 {
        self.slot_index
    }

    /// Lanes of the `n`th slot of an authored pattern (cyclic).
    pub fn authored_lanes(&self, n: u64) -> Option<LaneSet> {
        match &self.source {
            PatternSource::Authored(slots) => Some(slots[(n % slots.len() as u64) as usize]),
            PatternSource::Generated => None,
        }
    }

    /// Produces the next slot. `beats_elapsed` counts beats since the run
    /// started and gates holds during the grace period.
    pub fn next_event(&mut self, beats_elapsed: f64) -> BeatEvent {
        let n = self.slot_index;
        self.slot_index += 1;

        let lanes = match self.authored_lanes(n) {
            Some(lanes) => lanes,
            None => self.generate_lanes(n),
        };

        let mut event = BeatEvent::tap(lanes);
        if !lanes.is_chord()
            && beats_elapsed >= self.hold_grace_beats
            && self.hold_probability > 0.0
            && self.rng.random_bool(self.hold_probability)
        {
            event.hold_beats = self.rng.random_range(self.hold_min_beats..=self.hold_max_beats);
        }
        event
    }

    fn generate_lanes(&mut self, n: u64) -> LaneSet {
        let chord_allowed = self
            .last_chord_slot
            .map_or(true, |last| n - last >= self.chord_min_gap_slots);

        if chord_allowed && self.chord_probability > 0.0 && self.rng.random_bool(self.chord_probability) {
            let first = self.random_lane();
            let second = (first + self.rng.random_range(1..LANE_COUNT as u8)) % LANE_COUNT as u8;
            self.last_chord_slot = Some(n);
            self.last_lane = None;
            self.lane_run = 0;
            // Distinct by construction.
            return LaneSet::chord(first, second).unwrap_or(LaneSet::single(first));
        }

        let mut lane = self.random_lane();
        if self.max_lane_repeat > 0 && self.last_lane == Some(lane) && self.lane_run >= self.max_lane_repeat {
            lane = (lane + self.rng.random_range(1..LANE_COUNT as u8)) % LANE_COUNT as u8;
        }

        if self.last_lane == Some(lane) {
            self.lane_run += 1;
        } else {
            self.last_lane = Some(lane);
            self.lane_run = 1;
        }
        LaneSet::single(lane)
    }

    fn random_lane(&mut self) -> u8 {
        self.rng.random_range(0..LANE_COUNT as u8)
    }
}
