use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gameplay::field::TileId;
use crate::gameplay::judge::Judgment;
use crate::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunEndReason {
    /// A tap tile left its judgment window unhit.
    ExpiredTap,
    /// A hold tile was never pressed or was released too early.
    BrokenHold,
    /// A lane was pressed with nothing to hit (only under `WrongInputPolicy::EndRun`).
    WrongInput,
    /// The track finished and every tile was resolved.
    TrackComplete,
}

impl RunEndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunEndReason::ExpiredTap => "expired-tap",
            RunEndReason::BrokenHold => "broken-hold",
            RunEndReason::WrongInput => "wrong-input",
            RunEndReason::TrackComplete => "track-complete",
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, RunEndReason::TrackComplete)
    }
}

impl fmt::Display for RunEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete notifications for the presentation layer. Effects (flashes,
/// particles, sounds) react to these; nothing in the core reads them back.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    TileSpawned {
        id: TileId,
        lane: u8,
        arrival_ms: Millis,
        hold_ms: Millis,
    },
    TileRemoved {
        id: TileId,
        lane: u8,
    },
    /// A tap hit or a completed hold (`delta_ms` is 0 for holds).
    Judged {
        lane: u8,
        judgment: Judgment,
        points: u32,
        delta_ms: Millis,
        at_ms: Millis,
    },
    HoldStarted {
        id: TileId,
        lane: u8,
    },
    ScoreChanged {
        score: u64,
        combo: u32,
        max_combo: u32,
    },
    Paused,
    Resumed,
    RunEnded {
        reason: RunEndReason,
        at_ms: Millis,
    },
}
