use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use song_schema::{DifficultyKey, Song};

use crate::beat::BeatGrid;
use crate::error::SessionError;
use crate::gameplay::field::{TileField, TileId};
use crate::rules::{Rules, SpawnCaps};
use crate::Millis;

/// Stream offset so burst draws do not perturb the beat grid's sequence.
const BURST_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Travel time in beats as a function of elapsed beats: a linear ramp from
/// `initial` down to `floor`, divided by the difficulty speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelRamp {
    pub initial: f64,
    pub floor: f64,
    pub decay_per_beat: f64,
    pub speed: f64,
}

impl TravelRamp {
    pub fn beats(&self, elapsed_beats: f64) -> f64 {
        (self.initial - self.decay_per_beat * elapsed_beats.max(0.0)).max(self.floor) / self.speed
    }
}

/// Turns "time has passed" into new tiles.
///
/// Beat-slots fall on whole beats; the next one is due once
/// `next_due_beat * beat_ms <= now`. Slots are consumed strictly in order,
/// one `(beat, step)` pair at a time.
pub struct SpawnScheduler {
    grid: BeatGrid,
    beat_ms: Millis,
    base_step: u64,
    window: Millis,
    travel: TravelRamp,
    caps: SpawnCaps,

    burst_probability: f64,
    burst_length: u32,
    burst_remaining: u32,
    rng: Pcg32,

    start_beat: u64,
    next_due_beat: Option<u64>,
}

impl SpawnScheduler {
    /// Refuses songs that cannot be scheduled: non-positive tempo or a missing
    /// or invalid difficulty profile.
    pub fn new(song: &Song, difficulty: DifficultyKey, rules: &Rules) -> Result<Self, SessionError> {
        let beat_ms = song.beat_ms().ok_or_else(|| SessionError::InvalidTempo {
            title: song.title.clone(),
            bpm: song.bpm,
        })?;
        let profile = song
            .difficulty(difficulty)
            .filter(|profile| profile.is_valid())
            .ok_or_else(|| SessionError::MissingDifficulty {
                title: song.title.clone(),
                difficulty,
            })?;

        Ok(Self {
            grid: BeatGrid::new(song.pattern.as_deref(), rules, profile.density),
            beat_ms,
            base_step: rules.base_step_beats.max(1) as u64,
            window: rules.judgment_window_ms,
            travel: TravelRamp {
                initial: rules.travel_initial_beats,
                floor: rules.travel_floor_beats,
                decay_per_beat: rules.travel_decay_per_beat,
                speed: profile.speed,
            },
            caps: rules.caps,
            burst_probability: (rules.burst_probability * profile.density).clamp(0.0, 1.0),
            burst_length: rules.burst_length,
            burst_remaining: 0,
            rng: Pcg32::seed_from_u64(rules.seed ^ BURST_STREAM),
            start_beat: 0,
            next_due_beat: None,
        })
    }

    pub fn beat_ms(&self) -> Millis {
        self.beat_ms
    }

    pub fn grid(&self) -> &BeatGrid {
        &self.grid
    }

    pub fn travel(&self) -> TravelRamp {
        self.travel
    }

    pub fn next_due_beat(&self) -> Option<u64> {
        self.next_due_beat
    }

    pub fn in_burst(&self) -> bool {
        self.burst_remaining > 0
    }

    pub fn due_ms(&self, beat: u64) -> Millis {
        beat as f64 * self.beat_ms
    }

    /// Aligns the first slot with the audio position, so a run that starts
    /// mid-track spawns on the next whole beat.
    pub fn seed(&mut self, position_ms: Millis) {
        let beat_position = position_ms.max(0.0) / self.beat_ms;
        let beat = (beat_position - 1e-9).ceil().max(0.0) as u64;
        self.start_beat = beat;
        self.next_due_beat = Some(beat);
        log::debug!("spawn schedule seeded at beat {beat} ({position_ms:.1}ms)");
    }

    /// Materializes every slot due at `now` into `field`. Returns the new tiles.
    pub fn spawn_due(&mut self, now: Millis, field: &mut TileField) -> Vec<TileId> {
        if self.next_due_beat.is_none() {
            self.seed(now);
        }
        let mut spawned = Vec::new();

        while let Some(beat) = self.next_due_beat {
            let spawn_ms = self.due_ms(beat);
            if spawn_ms > now {
                break;
            }

            let elapsed_beats = (beat - self.start_beat) as f64;
            let event = self.grid.next_event(elapsed_beats);
            let arrival_ms = spawn_ms + self.travel.beats(elapsed_beats) * self.beat_ms;
            let hold_ms = event.hold_beats * self.beat_ms;

            if arrival_ms + self.window <= now {
                // The clock jumped past this slot; it could only spawn already missed.
                log::warn!("dropping stale beat-slot at beat {beat} (now {now:.1}ms)");
            } else {
                for &lane in event.lanes.lanes() {
                    if field.hold_blocks_lane(lane, arrival_ms, self.window) {
                        log::debug!("lane {lane} still holding, dropping it at beat {beat}");
                        continue;
                    }
                    if !self.has_room(field, lane) {
                        log::debug!("spawn cap reached, dropping lane {lane} at beat {beat}");
                        continue;
                    }
                    let id = field.spawn(lane, spawn_ms, arrival_ms, hold_ms);
                    spawned.push(id);
                }
            }

            let step = self.advance_step();
            self.next_due_beat = Some(beat + step);
        }

        spawned
    }

    fn has_room(&self, field: &TileField, lane: u8) -> bool {
        let lane_ok = self.caps.per_lane.map_or(true, |cap| field.live_in_lane(lane) < cap);
        let total_ok = self.caps.total.map_or(true, |cap| field.len() < cap);
        lane_ok && total_ok
    }

    fn advance_step(&mut self) -> u64 {
        if self.burst_remaining > 0 {
            self.burst_remaining -= 1;
            return if self.burst_remaining > 0 { 1 } else { self.base_step };
        }
        if self.burst_length > 0 && self.burst_probability > 0.0 && self.rng.random_bool(self.burst_probability) {
            self.burst_remaining = self.burst_length;
            return 1;
        }
        self.base_step
    }
}
