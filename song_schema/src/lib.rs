use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use thiserror::Error;

/// Number of input columns on the playfield.
pub const LANE_COUNT: usize = 4;

/// One authored beat-slot: the lanes that receive a tile (chords allowed).
pub type PatternSlot = Vec<u8>;

/// An authored pattern: one slot per beat-slot, replayed cyclically.
pub type LanePattern = Vec<PatternSlot>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyKey {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyKey {
    pub const ALL: [DifficultyKey; 3] = [DifficultyKey::Easy, DifficultyKey::Normal, DifficultyKey::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyKey::Easy => "easy",
            DifficultyKey::Normal => "normal",
            DifficultyKey::Hard => "hard",
        }
    }
}

impl fmt::Display for DifficultyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty: {0} (expected easy, normal or hard)")]
pub struct UnknownDifficulty(pub String);

impl FromStr for DifficultyKey {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(DifficultyKey::Easy),
            "normal" | "norm" => Ok(DifficultyKey::Normal),
            "hard" => Ok(DifficultyKey::Hard),
            other => Err(UnknownDifficulty(other.to_string())),
        }
    }
}

/// Per-difficulty multipliers. `speed` shortens travel time, `density` raises
/// burst and chord frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub speed: f64,
    pub density: f64,
}

impl DifficultyProfile {
    pub fn is_valid(&self) -> bool {
        self.speed.is_finite() && self.speed > 0.0 && self.density.is_finite() && self.density > 0.0
    }
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self {
            speed: 1.0,
            density: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub artist: String,
    /// Asset path of the backing track, resolved by the audio collaborator.
    #[serde(default)]
    pub audio: String,
    pub bpm: f64,
    pub difficulties: BTreeMap<DifficultyKey, DifficultyProfile>,
    /// Optional authored lane pattern, one entry per beat-slot, replayed cyclically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<LanePattern>,
}

impl Song {
    pub fn difficulty(&self, key: DifficultyKey) -> Option<&DifficultyProfile> {
        self.difficulties.get(&key)
    }

    /// Duration of one beat in milliseconds, `None` for a non-playable tempo.
    pub fn beat_ms(&self) -> Option<f64> {
        if self.bpm.is_finite() && self.bpm > 0.0 {
            Some(60_000.0 / self.bpm)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SongCatalog {
    pub songs: Vec<Song>,
}

impl SongCatalog {
    /// The songs shipped with the game.
    pub fn builtin() -> Self {
        let songs = vec![
            builtin_song(
                "Acelerada",
                "DJ Duzz",
                "assets/audio/acelerada.mp3",
                120.0,
                [(1.0, 0.8), (1.1, 1.0), (1.3, 1.3)],
                "0 1 2 3 2 1 0+2 3 1 0",
            ),
            builtin_song(
                "Não Era Amor",
                "MC Rita",
                "assets/audio/nao_era_amor.mp3",
                105.0,
                [(0.9, 0.8), (1.0, 1.0), (1.2, 1.3)],
                "1 1 2 2 3 3 1+3 0 0 2",
            ),
            builtin_song(
                "Montagem Xonada",
                "DJ LK da Escócia",
                "assets/audio/montagem_xonada.mp3",
                118.0,
                [(1.0, 0.8), (1.15, 1.0), (1.3, 1.4)],
                "0 2 1 3 0+3 2 1 1 2 0",
            ),
            builtin_song(
                "Montagem Coma",
                "MC GW",
                "assets/audio/montagem_coma.mp3",
                122.0,
                [(1.0, 0.8), (1.2, 1.0), (1.4, 1.5)],
                "3 2 1 0 1+3 2 0 2 3 1",
            ),
            builtin_song(
                "Dia Delícia",
                "MCs FunkMix",
                "assets/audio/dia_delicia.mp3",
                110.0,
                [(0.9, 0.8), (1.0, 1.0), (1.2, 1.2)],
                "0 0 1 1 2 2 3 3 1+2 0",
            ),
            builtin_song(
                "Mente Má",
                "MC Magalhães",
                "assets/audio/mente_ma.mp3",
                114.0,
                [(0.95, 0.85), (1.05, 1.0), (1.25, 1.3)],
                "2 1 2 3 0 1+3 2 0 1 3",
            ),
        ];
        Self { songs }
    }

    pub fn find(&self, title: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.title.eq_ignore_ascii_case(title))
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

fn builtin_song(
    title: &str,
    artist: &str,
    audio: &str,
    bpm: f64,
    profiles: [(f64, f64); 3],
    pattern: &str,
) -> Song {
    let difficulties = DifficultyKey::ALL
        .iter()
        .zip(profiles)
        .map(|(key, (speed, density))| (*key, DifficultyProfile { speed, density }))
        .collect();
    Song {
        title: title.to_string(),
        artist: artist.to_string(),
        audio: audio.to_string(),
        bpm,
        difficulties,
        // Built-in patterns are literals checked by the tests below.
        pattern: parse_pattern(pattern).ok(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("empty lane in slot {slot} ({token:?})")]
    EmptyLane { slot: usize, token: String },
    #[error("invalid lane {token:?} in slot {slot}")]
    InvalidLane { slot: usize, token: String },
    #[error("lane {lane} out of range in slot {slot} (lanes are 0-{max})", max = LANE_COUNT - 1)]
    LaneOutOfRange { slot: usize, lane: u8 },
}

/// Parses the compact text notation `"0 1 2 0+2 3"`: whitespace separates
/// beat-slots, `+` joins the lanes of a chord.
pub fn parse_pattern(src: &str) -> Result<LanePattern, PatternError> {
    src.split_whitespace()
        .enumerate()
        .map(|(slot, token)| {
            token
                .split('+')
                .map(|part| {
                    if part.is_empty() {
                        return Err(PatternError::EmptyLane {
                            slot,
                            token: token.to_string(),
                        });
                    }
                    let lane: u8 = part.parse().map_err(|_| PatternError::InvalidLane {
                        slot,
                        token: token.to_string(),
                    })?;
                    if lane as usize >= LANE_COUNT {
                        return Err(PatternError::LaneOutOfRange { slot, lane });
                    }
                    Ok(lane)
                })
                .collect()
        })
        .collect()
}

pub fn format_pattern(pattern: &[PatternSlot]) -> String {
    pattern
        .iter()
        .map(|slot| {
            slot.iter()
                .map(|lane| lane.to_string())
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect::<Vec<_>>()
        .join(" ")
}
