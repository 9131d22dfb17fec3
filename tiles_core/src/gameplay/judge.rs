use serde::{Deserialize, Serialize};

use crate::gameplay::events::RunEndReason;
use crate::gameplay::field::{TileField, TileId};
use crate::input::events::{InputEvent, InputKind};
use crate::rules::{Rules, WrongInputPolicy};
use crate::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Judgment {
    Perfect,
    Great,
    Good,
}

impl Judgment {
    pub fn points(&self) -> u32 {
        match self {
            Judgment::Perfect => 3,
            Judgment::Great => 2,
            Judgment::Good => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Judgment::Perfect => "PERFECT",
            Judgment::Great => "GREAT",
            Judgment::Good => "GOOD",
        }
    }
}

/// Classification of an absolute timing offset. Every offset maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Hit(Judgment),
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeWindows {
    pub perfect: Millis,
    pub great: Millis,
    pub window: Millis,
}

impl JudgeWindows {
    pub fn from_rules(rules: &Rules) -> Self {
        Self {
            perfect: rules.perfect_ms,
            great: rules.great_ms,
            window: rules.judgment_window_ms,
        }
    }

    pub fn classify(&self, delta: Millis) -> Timing {
        let abs_delta = delta.abs();
        if abs_delta < self.perfect {
            Timing::Hit(Judgment::Perfect)
        } else if abs_delta < self.great {
            Timing::Hit(Judgment::Great)
        } else if abs_delta < self.window {
            Timing::Hit(Judgment::Good)
        } else {
            Timing::Expired
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JudgeOutcome {
    /// A tap tile was hit and removed.
    Hit {
        tile: TileId,
        lane: u8,
        judgment: Judgment,
        delta: Millis,
    },
    /// A hold tile was pressed in time and is now held.
    HoldStarted { tile: TileId, lane: u8, delta: Millis },
    /// A hold tile was held long enough and was removed. Always top tier.
    HoldCompleted { tile: TileId, lane: u8 },
    /// Terminal failure.
    Failed {
        reason: RunEndReason,
        tile: Option<TileId>,
        lane: u8,
    },
    /// Nothing to resolve.
    Ignored,
}

impl JudgeOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, JudgeOutcome::Failed { .. })
    }
}

/// Turns player input and the passage of time into judgments.
pub struct JudgeMachine {
    pub windows: JudgeWindows,
    pub wrong_input: WrongInputPolicy,
}

impl Default for JudgeMachine {
    fn default() -> Self {
        Self::from_rules(&Rules::default())
    }
}

impl JudgeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: &Rules) -> Self {
        Self {
            windows: JudgeWindows::from_rules(rules),
            wrong_input: rules.wrong_input,
        }
    }

    pub fn process_input(&self, event: InputEvent, field: &mut TileField) -> JudgeOutcome {
        match event.kind {
            InputKind::Press => self.process_press(event, field),
            InputKind::Release => self.process_release(event, field),
        }
    }

    fn process_press(&self, event: InputEvent, field: &mut TileField) -> JudgeOutcome {
        let lane = event.lane;
        let Some(tile) = field.judgeable_in_lane(lane, event.timestamp, self.windows.window) else {
            return match self.wrong_input {
                WrongInputPolicy::Ignore => JudgeOutcome::Ignored,
                WrongInputPolicy::EndRun => JudgeOutcome::Failed {
                    reason: RunEndReason::WrongInput,
                    tile: None,
                    lane,
                },
            };
        };

        let id = tile.id;
        let delta = tile.offset(event.timestamp);

        if tile.is_hold() {
            field.set_held(id, true);
            return JudgeOutcome::HoldStarted { tile: id, lane, delta };
        }

        match self.windows.classify(delta) {
            Timing::Hit(judgment) => {
                field.remove(id);
                JudgeOutcome::Hit {
                    tile: id,
                    lane,
                    judgment,
                    delta,
                }
            }
            // Judgeable tiles are inside the window; kept for exhaustiveness.
            Timing::Expired => JudgeOutcome::Ignored,
        }
    }

    fn process_release(&self, event: InputEvent, field: &mut TileField) -> JudgeOutcome {
        let lane = event.lane;
        let Some(tile) = field.held_in_lane(lane) else {
            return JudgeOutcome::Ignored;
        };
        let id = tile.id;

        if event.timestamp >= tile.completion_ms(self.windows.window) {
            field.remove(id);
            JudgeOutcome::HoldCompleted { tile: id, lane }
        } else {
            field.remove(id);
            JudgeOutcome::Failed {
                reason: RunEndReason::BrokenHold,
                tile: Some(id),
                lane,
            }
        }
    }

    /// Passive per-frame check: completes holds that have been held long
    /// enough and fails tiles whose window has passed. Each tile yields at
    /// most one outcome per sweep.
    pub fn sweep(&self, now: Millis, field: &mut TileField) -> Vec<JudgeOutcome> {
        let mut results = Vec::new();

        let due: Vec<_> = field
            .iter()
            .filter_map(|tile| {
                if tile.is_held() {
                    (now >= tile.completion_ms(self.windows.window))
                        .then(|| JudgeOutcome::HoldCompleted {
                            tile: tile.id,
                            lane: tile.lane,
                        })
                } else if tile.is_overdue(now, self.windows.window) {
                    let reason = if tile.is_hold() {
                        RunEndReason::BrokenHold
                    } else {
                        RunEndReason::ExpiredTap
                    };
                    Some(JudgeOutcome::Failed {
                        reason,
                        tile: Some(tile.id),
                        lane: tile.lane,
                    })
                } else {
                    None
                }
            })
            .collect();

        for outcome in due {
            if let JudgeOutcome::HoldCompleted { tile, .. }
            | JudgeOutcome::Failed { tile: Some(tile), .. } = outcome
            {
                field.remove(tile);
            }
            results.push(outcome);
        }
        results
    }
}
