use std::cell::RefCell;
use std::rc::Rc;

use crossbeam_channel::Sender;
use song_schema::{DifficultyKey, Song};

use crate::error::SessionError;
use crate::frame::{DisplayLink, FrameControl, FrameSubscription};
use crate::gameplay::events::{GameEvent, RunEndReason};
use crate::gameplay::field::{TileField, TileView};
use crate::gameplay::judge::{JudgeMachine, JudgeOutcome, Judgment};
use crate::gameplay::run_state::RunState;
use crate::gameplay::spawn::SpawnScheduler;
use crate::input::events::InputEvent;
use crate::input::InputQueue;
use crate::rules::Rules;
use crate::store::RunResult;
use crate::time::{ClockSource, Conductor};
use crate::Millis;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionPhase {
    Running,
    Paused,
    Ended { reason: RunEndReason, at_ms: Millis },
}

/// What one frame tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Continue,
    /// Paused: nothing ran, keep the frame callback alive.
    Skipped,
    Ended(RunEndReason),
}

/// One run of one song: the game loop driver.
///
/// Each [`frame`](Self::frame) takes a single clock snapshot and then, in
/// order, spawns due tiles, resolves queued input, sweeps for completed holds
/// and missed tiles, and checks for track completion. Once ended the session
/// is inert.
pub struct GameSession {
    title: String,
    difficulty: DifficultyKey,
    rules: Rules,

    clock: Box<dyn ClockSource>,
    conductor: Conductor,
    scheduler: SpawnScheduler,
    field: TileField,
    judge: JudgeMachine,
    run: RunState,
    inputs: InputQueue,

    events: Vec<GameEvent>,
    phase: SessionPhase,
    now: Millis,
    frames: u64,
}

impl GameSession {
    /// Prepares a run. Configuration problems are returned before anything is
    /// scheduled; the caller should send the player back to song selection.
    pub fn start(
        song: Option<&Song>,
        difficulty: DifficultyKey,
        rules: Rules,
        clock: Box<dyn ClockSource>,
    ) -> Result<Self, SessionError> {
        let song = song.ok_or(SessionError::NoSongSelected)?;
        rules.validate()?;
        let scheduler = SpawnScheduler::new(song, difficulty, &rules)?;

        log::info!(
            "run started: {} [{}] at {} bpm ({} pattern)",
            song.title,
            difficulty,
            song.bpm,
            if scheduler.grid().is_authored() { "authored" } else { "generated" }
        );

        Ok(Self {
            title: song.title.clone(),
            difficulty,
            conductor: Conductor::new(rules.max_extrapolation_ms),
            judge: JudgeMachine::from_rules(&rules),
            rules,
            clock,
            scheduler,
            field: TileField::new(),
            run: RunState::new(),
            inputs: InputQueue::new(),
            events: Vec::new(),
            phase: SessionPhase::Running,
            now: 0.0,
            frames: 0,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn difficulty(&self) -> DifficultyKey {
        self.difficulty
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, SessionPhase::Ended { .. })
    }

    pub fn end_reason(&self) -> Option<RunEndReason> {
        match self.phase {
            SessionPhase::Ended { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Song time of the last frame snapshot.
    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    pub fn field(&self) -> &TileField {
        &self.field
    }

    pub fn scheduler(&self) -> &SpawnScheduler {
        &self.scheduler
    }

    pub fn conductor(&self) -> &Conductor {
        &self.conductor
    }

    /// Positions for rendering at the last snapshot.
    pub fn snapshot(&self) -> Vec<TileView> {
        self.field.snapshot(&self.rules.geometry, self.now)
    }

    /// Sender for input producers on other threads; events are resolved at
    /// the next frame.
    pub fn input_sender(&self) -> Sender<InputEvent> {
        self.inputs.sender()
    }

    pub fn queue_input(&self, event: InputEvent) {
        self.inputs.push(event);
    }

    /// Queues a press stamped with the current song time.
    pub fn press(&self, lane: u8) {
        self.inputs.push(InputEvent::press(lane, self.now));
    }

    pub fn release(&self, lane: u8) {
        self.inputs.push(InputEvent::release(lane, self.now));
    }

    /// Takes the events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn frame(&mut self, render_ms: Millis) -> FrameOutcome {
        match self.phase {
            SessionPhase::Ended { reason, .. } => return FrameOutcome::Ended(reason),
            SessionPhase::Paused => return FrameOutcome::Skipped,
            SessionPhase::Running => {}
        }
        self.frames += 1;

        let now = self.conductor.sample(self.clock.as_ref(), render_ms);
        let track_finished = self.clock.is_finished();
        self.now = now;

        if !track_finished {
            for id in self.scheduler.spawn_due(now, &mut self.field) {
                if let Some(tile) = self.field.get(id) {
                    log::debug!("spawned tile {id} lane {} arriving {:.1}ms", tile.lane, tile.arrival_ms);
                    self.events.push(GameEvent::TileSpawned {
                        id,
                        lane: tile.lane,
                        arrival_ms: tile.arrival_ms,
                        hold_ms: tile.hold_ms,
                    });
                }
            }
        }

        for event in self.inputs.drain() {
            let outcome = self.judge.process_input(event, &mut self.field);
            self.apply(outcome, event.timestamp);
            if self.is_ended() {
                return self.outcome();
            }
        }

        let outcomes = self.judge.sweep(now, &mut self.field);
        let (failures, resolved): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(JudgeOutcome::is_failure);
        // Completions from this pass count before any failure ends the run.
        for outcome in resolved.into_iter().chain(failures) {
            self.apply(outcome, now);
            if self.is_ended() {
                return self.outcome();
            }
        }

        if track_finished && self.field.is_empty() {
            self.end(RunEndReason::TrackComplete, now);
        }
        self.outcome()
    }

    fn outcome(&self) -> FrameOutcome {
        match self.phase {
            SessionPhase::Ended { reason, .. } => FrameOutcome::Ended(reason),
            SessionPhase::Paused => FrameOutcome::Skipped,
            SessionPhase::Running => FrameOutcome::Continue,
        }
    }

    fn apply(&mut self, outcome: JudgeOutcome, at_ms: Millis) {
        match outcome {
            JudgeOutcome::Hit {
                tile,
                lane,
                judgment,
                delta,
            } => {
                log::debug!("{} on lane {lane} ({delta:+.1}ms)", judgment.label());
                self.events.push(GameEvent::TileRemoved { id: tile, lane });
                self.score(lane, judgment, delta, at_ms);
            }
            JudgeOutcome::HoldStarted { tile, lane, delta } => {
                log::debug!("hold {tile} started on lane {lane} ({delta:+.1}ms)");
                self.events.push(GameEvent::HoldStarted { id: tile, lane });
            }
            JudgeOutcome::HoldCompleted { tile, lane } => {
                log::debug!("hold {tile} completed on lane {lane}");
                self.events.push(GameEvent::TileRemoved { id: tile, lane });
                self.score(lane, Judgment::Perfect, 0.0, at_ms);
            }
            JudgeOutcome::Failed { reason, tile, lane } => {
                if let Some(id) = tile {
                    self.events.push(GameEvent::TileRemoved { id, lane });
                }
                self.end(reason, at_ms);
            }
            JudgeOutcome::Ignored => {}
        }
    }

    fn score(&mut self, lane: u8, judgment: Judgment, delta_ms: Millis, at_ms: Millis) {
        let points = judgment.points();
        self.run.add_points(points);
        self.run.register_hit();
        self.events.push(GameEvent::Judged {
            lane,
            judgment,
            points,
            delta_ms,
            at_ms,
        });
        self.events.push(GameEvent::ScoreChanged {
            score: self.run.score,
            combo: self.run.combo,
            max_combo: self.run.max_combo,
        });
    }

    fn end(&mut self, reason: RunEndReason, at_ms: Millis) {
        if self.is_ended() {
            return;
        }
        self.phase = SessionPhase::Ended { reason, at_ms };
        self.events.push(GameEvent::RunEnded { reason, at_ms });
        log::info!(
            "run ended: {} [{}] {reason} at {at_ms:.1}ms, score {} max combo {}",
            self.title,
            self.difficulty,
            self.run.score,
            self.run.max_combo
        );
    }

    /// Stops the frame work. Audio transport is paused by the caller.
    pub fn pause(&mut self, render_ms: Millis) {
        if self.phase != SessionPhase::Running {
            return;
        }
        self.phase = SessionPhase::Paused;
        self.run.pause();
        self.conductor.pause(render_ms);
        self.events.push(GameEvent::Paused);
    }

    pub fn resume(&mut self, render_ms: Millis) {
        if self.phase != SessionPhase::Paused {
            return;
        }
        self.phase = SessionPhase::Running;
        self.run.resume();
        self.conductor.resume(render_ms);
        self.events.push(GameEvent::Resumed);
    }

    /// Final numbers once the run has ended.
    pub fn result(&self) -> Option<RunResult> {
        match self.phase {
            SessionPhase::Ended { reason, at_ms } => Some(RunResult {
                title: self.title.clone(),
                difficulty: self.difficulty,
                score: self.run.score,
                max_combo: self.run.max_combo,
                reason,
                ended_at_ms: at_ms,
            }),
            _ => None,
        }
    }

    /// Drives a shared session from a display link. The callback stops on
    /// its own when the run ends; dropping the subscription stops it early.
    pub fn attach(session: &Rc<RefCell<Self>>, link: &DisplayLink) -> FrameSubscription {
        let session = Rc::clone(session);
        link.register(move |render_ms| match session.borrow_mut().frame(render_ms) {
            FrameOutcome::Ended(_) => FrameControl::Stop,
            FrameOutcome::Continue | FrameOutcome::Skipped => FrameControl::Continue,
        })
    }
}
