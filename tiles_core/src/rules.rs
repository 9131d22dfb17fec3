//! Tunable gameplay rules.
//!
//! One canonical rule set ships as `Rules::default()`; every field can be
//! overridden from JSON (missing fields keep their defaults).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SessionError;
use crate::Millis;

/// What happens when a lane is pressed with nothing judgeable in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WrongInputPolicy {
    /// The press is ignored.
    #[default]
    Ignore,
    /// The press ends the run.
    EndRun,
}

/// Target-device class, selects the live tile caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PerformancePreset {
    Constrained,
    #[default]
    Standard,
}

impl PerformancePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformancePreset::Constrained => "constrained",
            PerformancePreset::Standard => "standard",
        }
    }

    pub fn caps(&self) -> SpawnCaps {
        match self {
            PerformancePreset::Constrained => SpawnCaps {
                per_lane: Some(1),
                total: Some(12),
            },
            PerformancePreset::Standard => SpawnCaps {
                per_lane: Some(3),
                total: Some(24),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown preset: {0} (expected standard or constrained)")]
pub struct UnknownPreset(pub String);

impl FromStr for PerformancePreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "constrained" | "low" => Ok(PerformancePreset::Constrained),
            "standard" | "default" => Ok(PerformancePreset::Standard),
            other => Err(UnknownPreset(other.to_string())),
        }
    }
}

/// Limits on simultaneously live tiles. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnCaps {
    pub per_lane: Option<usize>,
    pub total: Option<usize>,
}

impl Default for SpawnCaps {
    fn default() -> Self {
        PerformancePreset::default().caps()
    }
}

/// Vertical layout of the playfield in pixels (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldGeometry {
    /// Where new tiles appear (above the visible area).
    pub spawn_y: f64,
    /// The line tiles should be hit on.
    pub hit_line_y: f64,
    /// Height of the "near the line" highlight band above the hit line.
    pub near_band_px: f64,
}

impl Default for FieldGeometry {
    fn default() -> Self {
        Self {
            spawn_y: -80.0,
            hit_line_y: 860.0,
            near_band_px: 80.0,
        }
    }
}

impl FieldGeometry {
    pub fn travel_distance(&self) -> f64 {
        self.hit_line_y - self.spawn_y
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    // === Judgment ===
    /// Half-width of the window around arrival during which input resolves a tile.
    pub judgment_window_ms: Millis,
    /// Offsets below this are PERFECT.
    pub perfect_ms: Millis,
    /// Offsets below this (and not PERFECT) are GREAT.
    pub great_ms: Millis,
    pub wrong_input: WrongInputPolicy,

    // === Cadence ===
    /// Beats between beat-slots outside a burst.
    pub base_step_beats: u32,
    /// Chance that a non-burst slot starts a burst (scaled by density).
    pub burst_probability: f64,
    /// Number of step-1 advances in a burst.
    pub burst_length: u32,

    // === Generated patterns ===
    /// Chance of a two-lane chord on a generated slot (scaled by density).
    pub chord_probability: f64,
    /// Minimum slots between two generated chords.
    pub chord_min_gap_slots: u32,
    /// Longest run of consecutive generated slots on one lane.
    pub max_lane_repeat: u32,

    // === Holds ===
    pub hold_probability: f64,
    pub hold_min_beats: f64,
    pub hold_max_beats: f64,
    /// Beats from run start during which no holds are generated.
    pub hold_grace_beats: f64,

    // === Travel ramp ===
    pub travel_initial_beats: f64,
    pub travel_floor_beats: f64,
    /// Travel beats removed per elapsed beat of the run.
    pub travel_decay_per_beat: f64,

    // === Limits ===
    pub caps: SpawnCaps,
    pub geometry: FieldGeometry,

    // === Clock ===
    /// How far past a stale audio reading the conductor may extrapolate.
    pub max_extrapolation_ms: Millis,

    /// Seed for generated patterns, holds and bursts.
    pub seed: u64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            judgment_window_ms: 220.0,
            perfect_ms: 60.0,
            great_ms: 120.0,
            wrong_input: WrongInputPolicy::Ignore,

            base_step_beats: 2,
            burst_probability: 0.10,
            burst_length: 3,

            chord_probability: 0.05,
            chord_min_gap_slots: 5,
            max_lane_repeat: 2,

            hold_probability: 0.10,
            hold_min_beats: 1.0,
            hold_max_beats: 1.8,
            hold_grace_beats: 8.0,

            travel_initial_beats: 2.0,
            travel_floor_beats: 1.4,
            travel_decay_per_beat: 0.005,

            caps: SpawnCaps::default(),
            geometry: FieldGeometry::default(),

            max_extrapolation_ms: 250.0,

            seed: 0x5EED_F00D,
        }
    }
}

impl Rules {
    /// Rules with the caps of a performance preset.
    pub fn from_preset(preset: PerformancePreset) -> Self {
        Self {
            caps: preset.caps(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Same rules with every random feature switched off: fixed step, no
    /// bursts, chords or holds. Authored patterns then replay verbatim.
    pub fn deterministic(mut self) -> Self {
        self.burst_probability = 0.0;
        self.chord_probability = 0.0;
        self.hold_probability = 0.0;
        self
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        let fail = |msg: &str| Err(SessionError::InvalidRules(msg.to_string()));

        if !(self.judgment_window_ms > 0.0) {
            return fail("judgment_window_ms must be > 0");
        }
        if !(self.perfect_ms > 0.0 && self.perfect_ms <= self.great_ms && self.great_ms <= self.judgment_window_ms) {
            return fail("tier edges must satisfy 0 < perfect_ms <= great_ms <= judgment_window_ms");
        }
        if self.base_step_beats == 0 {
            return fail("base_step_beats must be >= 1");
        }
        for (name, p) in [
            ("burst_probability", self.burst_probability),
            ("chord_probability", self.chord_probability),
            ("hold_probability", self.hold_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SessionError::InvalidRules(format!("{name} must be within [0, 1]")));
            }
        }
        if !(self.hold_min_beats > 0.0 && self.hold_min_beats <= self.hold_max_beats) {
            return fail("hold duration range must satisfy 0 < hold_min_beats <= hold_max_beats");
        }
        if !(self.travel_floor_beats > 0.0 && self.travel_floor_beats <= self.travel_initial_beats) {
            return fail("travel ramp must satisfy 0 < travel_floor_beats <= travel_initial_beats");
        }
        if self.travel_decay_per_beat < 0.0 {
            return fail("travel_decay_per_beat must be >= 0");
        }
        if !(self.geometry.travel_distance() > 0.0) {
            return fail("hit_line_y must be below spawn_y");
        }
        if self.max_extrapolation_ms < 0.0 {
            return fail("max_extrapolation_ms must be >= 0");
        }
        Ok(())
    }
}
