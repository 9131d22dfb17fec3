//! Headless runs: load songs and rules from JSON, play a session to the end
//! with a simulated audio clock, and report what happened.

use std::cell::RefCell;
use std::rc::Rc;
use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use song_schema::{DifficultyKey, Song, SongCatalog};
use tiles_core::frame::DisplayLink;
use tiles_core::gameplay::{GameEvent, GameSession, Judgment, SpawnScheduler, TileField};
use tiles_core::input::events::InputEvent;
use tiles_core::rules::Rules;
use tiles_core::store::{finalize_run, HighScoreStore, RunSummary};
use tiles_core::time::AudioClock;
use tiles_core::{Millis, SessionError};

pub fn load_catalog_from_path(path: impl AsRef<Path>) -> anyhow::Result<SongCatalog> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read catalog: {}", path.display()))?;
    let catalog: SongCatalog = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse catalog json: {}", path.display()))?;
    Ok(catalog)
}

pub fn load_catalog_from_str(json: &str) -> anyhow::Result<SongCatalog> {
    let catalog: SongCatalog = serde_json::from_str(json).context("failed to parse catalog json")?;
    Ok(catalog)
}

pub fn load_rules_from_path(path: impl AsRef<Path>) -> anyhow::Result<Rules> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).with_context(|| format!("failed to read rules: {}", path.display()))?;
    let rules = Rules::from_json(&json).with_context(|| format!("failed to parse rules json: {}", path.display()))?;
    Ok(rules)
}

/// Scripted inputs as a JSON array of `{"lane": 0, "kind": "press", "at_ms": 1000}`.
pub fn load_script_from_path(path: impl AsRef<Path>) -> anyhow::Result<Vec<InputEvent>> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read input script: {}", path.display()))?;
    let steps: Vec<ScriptStep> = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse input script: {}", path.display()))?;
    Ok(steps.into_iter().map(ScriptStep::into_event).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScriptKind {
    Press,
    Release,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScriptStep {
    lane: u8,
    kind: ScriptKind,
    at_ms: Millis,
}

impl ScriptStep {
    fn into_event(self) -> InputEvent {
        match self.kind {
            ScriptKind::Press => InputEvent::press(self.lane, self.at_ms),
            ScriptKind::Release => InputEvent::release(self.lane, self.at_ms),
        }
    }
}

/// Where the simulated player's input comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum InputPlan {
    /// Nobody plays: the first tile expires.
    Idle,
    /// Presses every tile exactly on arrival. Holds stay down until they complete.
    Autoplay,
    /// Fixed events, delivered once their timestamp has passed.
    Scripted(Vec<InputEvent>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Render interval (display refresh).
    pub frame_ms: Millis,
    /// How often the audio callback publishes a position.
    pub audio_period_ms: Millis,
    /// Track length; the clock reports finished from here on.
    pub track_length_ms: Millis,
    pub input: InputPlan,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frame_ms: 1000.0 / 60.0,
            audio_period_ms: 1024.0 / 44.1,
            track_length_ms: 30_000.0,
            input: InputPlan::Autoplay,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentCounts {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
}

impl JudgmentCounts {
    fn record(&mut self, judgment: Judgment) {
        match judgment {
            Judgment::Perfect => self.perfect += 1,
            Judgment::Great => self.great += 1,
            Judgment::Good => self.good += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.perfect + self.great + self.good
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub summary: RunSummary,
    pub frames: u64,
    pub tiles_spawned: u32,
    pub holds_started: u32,
    pub judgments: JudgmentCounts,
}

/// Plays one run to its end and records the result in `store`.
pub fn simulate(
    song: &Song,
    difficulty: DifficultyKey,
    rules: Rules,
    config: &SimulationConfig,
    store: &dyn HighScoreStore,
) -> anyhow::Result<SimulationReport> {
    anyhow::ensure!(config.frame_ms > 0.0, "frame interval must be positive");
    anyhow::ensure!(config.audio_period_ms > 0.0, "audio period must be positive");

    let (clock, audio) = AudioClock::new();
    let session = GameSession::start(Some(song), difficulty, rules, Box::new(clock))
        .with_context(|| format!("cannot start {} [{difficulty}]", song.title))?;
    let session = Rc::new(RefCell::new(session));

    let link = DisplayLink::new();
    let subscription = GameSession::attach(&session, &link);

    let mut pending: Vec<InputEvent> = match &config.input {
        InputPlan::Scripted(events) => events.clone(),
        _ => Vec::new(),
    };
    let mut judgments = JudgmentCounts::default();
    let mut tiles_spawned = 0;
    let mut holds_started = 0;

    // A stuck hold or an endless pattern still ends: past the track, every
    // remaining tile expires within a few beats.
    let deadline = config.track_length_ms + 60_000.0;
    let mut render: Millis = 0.0;
    let mut next_audio: Millis = 0.0;

    while subscription.is_active() {
        anyhow::ensure!(render <= deadline, "run did not end by {deadline:.0}ms");

        if render >= next_audio {
            let position = render.min(config.track_length_ms);
            audio.publish(position);
            if render >= config.track_length_ms {
                audio.finish();
            }
            next_audio += config.audio_period_ms;
        }

        let now = session.borrow().now();
        pending.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        let due = pending.iter().take_while(|e| e.timestamp <= now).count();
        for event in pending.drain(..due) {
            session.borrow().queue_input(event);
        }

        link.fire(render);

        for event in session.borrow_mut().drain_events() {
            match event {
                GameEvent::TileSpawned {
                    lane, arrival_ms, ..
                } => {
                    tiles_spawned += 1;
                    if config.input == InputPlan::Autoplay {
                        pending.push(InputEvent::press(lane, arrival_ms));
                    }
                }
                GameEvent::HoldStarted { .. } => holds_started += 1,
                GameEvent::Judged { judgment, .. } => judgments.record(judgment),
                _ => {}
            }
        }

        render += config.frame_ms;
    }

    let session = session.borrow();
    let result = session.result().context("run stopped without an end reason")?;
    Ok(SimulationReport {
        summary: finalize_run(store, &result),
        frames: session.frames(),
        tiles_spawned,
        holds_started,
        judgments,
    })
}

/// One beat-slot as the scheduler produces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub slot: usize,
    pub beat: u64,
    pub due_ms: Millis,
    pub arrival_ms: Millis,
    pub lanes: Vec<u8>,
    pub hold_ms: Millis,
}

/// The first `slots` beat-slots of a run started at song position 0.
pub fn spawn_timeline(
    song: &Song,
    difficulty: DifficultyKey,
    rules: &Rules,
    slots: usize,
) -> Result<Vec<TimelineRow>, SessionError> {
    let mut scheduler = SpawnScheduler::new(song, difficulty, rules)?;
    scheduler.seed(0.0);
    let mut field = TileField::new();
    let mut rows = Vec::with_capacity(slots);

    for slot in 0..slots {
        let Some(beat) = scheduler.next_due_beat() else {
            break;
        };
        let due_ms = scheduler.due_ms(beat);
        let ids = scheduler.spawn_due(due_ms, &mut field);

        let tiles: Vec<_> = ids.iter().filter_map(|id| field.get(*id)).collect();
        rows.push(TimelineRow {
            slot,
            beat,
            due_ms,
            arrival_ms: tiles.first().map_or(due_ms, |t| t.arrival_ms),
            lanes: tiles.iter().map(|t| t.lane).collect(),
            hold_ms: tiles.first().map_or(0.0, |t| t.hold_ms),
        });
        // Only the schedule matters here; keep caps out of the picture.
        field.clear();
    }
    Ok(rows)
}
