use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use song_schema::{parse_pattern, DifficultyKey, DifficultyProfile, Song};
use tiles_core::frame::DisplayLink;
use tiles_core::gameplay::{FrameOutcome, GameEvent, GameSession, Judgment, RunEndReason};
use tiles_core::input::events::InputEvent;
use tiles_core::rules::{Rules, WrongInputPolicy};
use tiles_core::time::{AudioClock, AudioClockHandle, NoClock};

/// BPM 120 (500ms beats), neutral difficulty.
fn scenario_song(pattern: &str) -> Song {
    Song {
        title: "Scenario".to_string(),
        artist: "Test".to_string(),
        audio: String::new(),
        bpm: 120.0,
        difficulties: BTreeMap::from([(
            DifficultyKey::Normal,
            DifficultyProfile {
                speed: 1.0,
                density: 1.0,
            },
        )]),
        pattern: Some(parse_pattern(pattern).unwrap()),
    }
}

/// Fixed two-beat travel so arrivals are exactly spawn + 1000ms.
fn scenario_rules() -> Rules {
    Rules {
        travel_decay_per_beat: 0.0,
        ..Rules::default().deterministic()
    }
}

fn start(pattern: &str, rules: Rules) -> (GameSession, AudioClockHandle) {
    let (clock, handle) = AudioClock::new();
    let song = scenario_song(pattern);
    let session = GameSession::start(Some(&song), DifficultyKey::Normal, rules, Box::new(clock)).unwrap();
    (session, handle)
}

/// One frame with the audio clock reporting exactly `t`.
fn tick(session: &mut GameSession, handle: &AudioClockHandle, t: f64) -> FrameOutcome {
    handle.publish(t);
    session.frame(t)
}

fn spawned_lanes(events: &[GameEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::TileSpawned { lane, .. } => Some(*lane),
            _ => None,
        })
        .collect()
}

#[test]
fn scenario_a_authored_pattern_spawns_every_second_beat() {
    let (mut session, handle) = start("0 1 2", scenario_rules());
    let mut lanes = Vec::new();

    tick(&mut session, &handle, 0.0);
    lanes.extend(spawned_lanes(&session.drain_events()));
    assert_eq!(lanes, vec![0]);

    tick(&mut session, &handle, 500.0);
    assert!(spawned_lanes(&session.drain_events()).is_empty());

    session.queue_input(InputEvent::press(0, 1_000.0));
    tick(&mut session, &handle, 1_000.0);
    lanes.extend(spawned_lanes(&session.drain_events()));

    session.queue_input(InputEvent::press(1, 2_000.0));
    tick(&mut session, &handle, 2_000.0);
    lanes.extend(spawned_lanes(&session.drain_events()));

    assert_eq!(lanes, vec![0, 1, 2]);
    assert_eq!(session.scheduler().beat_ms(), 500.0);
    let spawn_times: Vec<f64> = session.field().iter().map(|t| t.spawn_ms).collect();
    assert_eq!(spawn_times, vec![2_000.0]);
    assert_eq!(session.run_state().score, 6);
}

#[test]
fn scenario_b_on_time_press_scores_perfect() {
    let (mut session, handle) = start("0", scenario_rules());
    tick(&mut session, &handle, 0.0);
    session.drain_events();

    session.queue_input(InputEvent::press(0, 1_040.0));
    assert_eq!(tick(&mut session, &handle, 1_050.0), FrameOutcome::Continue);

    let events = session.drain_events();
    assert!(events.contains(&GameEvent::Judged {
        lane: 0,
        judgment: Judgment::Perfect,
        points: 3,
        delta_ms: 40.0,
        at_ms: 1_040.0,
    }));
    let run = session.run_state();
    assert_eq!((run.score, run.combo, run.max_combo), (3, 1, 1));
}

#[test]
fn scenario_c_missed_tap_ends_the_run() {
    let (mut session, handle) = start("0 1", scenario_rules());
    tick(&mut session, &handle, 0.0);
    assert_eq!(tick(&mut session, &handle, 1_219.0), FrameOutcome::Continue);
    assert_eq!(
        tick(&mut session, &handle, 1_220.0),
        FrameOutcome::Ended(RunEndReason::ExpiredTap)
    );

    let events = session.drain_events();
    let ended: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, GameEvent::RunEnded { .. }))
        .collect();
    assert_eq!(
        ended,
        vec![&GameEvent::RunEnded {
            reason: RunEndReason::ExpiredTap,
            at_ms: 1_220.0
        }]
    );

    // Ended is absorbing.
    let frames = session.frames();
    let live = session.field().len();
    session.queue_input(InputEvent::press(1, 2_000.0));
    assert_eq!(
        tick(&mut session, &handle, 2_000.0),
        FrameOutcome::Ended(RunEndReason::ExpiredTap)
    );
    assert_eq!(session.frames(), frames);
    assert_eq!(session.field().len(), live);
    assert_eq!(session.run_state().score, 0);
    assert!(session.drain_events().is_empty());
}

#[test]
fn scenario_d_hold_completes_at_release_point() {
    let rules = Rules {
        hold_probability: 1.0,
        hold_min_beats: 1.5,
        hold_max_beats: 1.5,
        hold_grace_beats: 0.0,
        ..scenario_rules()
    };
    let (mut session, handle) = start("0 1", rules);

    tick(&mut session, &handle, 0.0);
    let events = session.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::TileSpawned {
            lane: 0,
            arrival_ms,
            hold_ms,
            ..
        } if *arrival_ms == 1_000.0 && *hold_ms == 750.0
    )));

    session.queue_input(InputEvent::press(0, 1_050.0));
    tick(&mut session, &handle, 1_050.0);
    assert!(session
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::HoldStarted { lane: 0, .. })));
    assert_eq!(session.run_state().score, 0);

    tick(&mut session, &handle, 1_300.0);
    tick(&mut session, &handle, 1_529.0);
    assert_eq!(session.run_state().score, 0);

    assert_eq!(tick(&mut session, &handle, 1_530.0), FrameOutcome::Continue);
    let run = session.run_state();
    assert_eq!((run.score, run.combo), (3, 1));
    assert!(session.field().held_in_lane(0).is_none());
}

#[test]
fn scenario_e_track_end_waits_for_live_tiles() {
    let (mut session, handle) = start("0", scenario_rules());
    tick(&mut session, &handle, 0.0);
    session.drain_events();
    handle.finish();

    assert_eq!(tick(&mut session, &handle, 600.0), FrameOutcome::Continue);
    assert_eq!(session.field().len(), 1);

    session.queue_input(InputEvent::press(0, 1_000.0));
    assert_eq!(
        tick(&mut session, &handle, 1_000.0),
        FrameOutcome::Ended(RunEndReason::TrackComplete)
    );
    // Nothing spawns once the track has finished.
    assert!(spawned_lanes(&session.drain_events()).is_empty());
    assert_eq!(session.run_state().score, 3);

    let result = session.result().unwrap();
    assert_eq!(result.reason, RunEndReason::TrackComplete);
    assert_eq!(result.score, 3);
}

#[test]
fn strict_wrong_input_ends_the_run() {
    let rules = Rules {
        wrong_input: WrongInputPolicy::EndRun,
        ..scenario_rules()
    };
    let (mut session, handle) = start("0", rules);
    tick(&mut session, &handle, 0.0);
    session.queue_input(InputEvent::press(3, 100.0));
    assert_eq!(
        tick(&mut session, &handle, 116.0),
        FrameOutcome::Ended(RunEndReason::WrongInput)
    );
}

#[test]
fn lenient_wrong_input_is_ignored() {
    let (mut session, handle) = start("0", scenario_rules());
    tick(&mut session, &handle, 0.0);
    session.queue_input(InputEvent::press(3, 100.0));
    assert_eq!(tick(&mut session, &handle, 116.0), FrameOutcome::Continue);
    assert_eq!(session.run_state().combo, 0);
}

#[test]
fn combo_never_decreases_during_a_run() {
    let (mut session, handle) = start("0 1 2 3", scenario_rules());
    let mut pending: Vec<InputEvent> = Vec::new();
    let mut last_combo = 0;
    let mut t = 0.0;
    while t <= 8_000.0 {
        for event in session.drain_events() {
            if let GameEvent::TileSpawned { lane, arrival_ms, .. } = event {
                pending.push(InputEvent::press(lane, arrival_ms + 70.0));
            }
        }
        // Only inputs that have already happened by this frame.
        let (due, later): (Vec<_>, Vec<_>) = pending.into_iter().partition(|e| e.timestamp <= t);
        pending = later;
        for event in due {
            session.queue_input(event);
        }
        assert_eq!(tick(&mut session, &handle, t), FrameOutcome::Continue);
        let run = session.run_state();
        assert!(run.combo >= last_combo);
        assert!(run.max_combo >= run.combo);
        last_combo = run.combo;
        t += 50.0;
    }
    assert!(last_combo >= 7);
}

#[test]
fn display_link_stops_when_the_run_ends() {
    let song = scenario_song("0");
    let session = GameSession::start(Some(&song), DifficultyKey::Normal, scenario_rules(), Box::new(NoClock)).unwrap();
    let session = Rc::new(RefCell::new(session));
    let link = DisplayLink::new();
    let subscription = GameSession::attach(&session, &link);

    let mut render = 0.0;
    while subscription.is_active() && render < 5_000.0 {
        link.fire(render);
        render += 16.0;
    }

    assert!(!subscription.is_active());
    assert_eq!(link.active_count(), 0);
    assert_eq!(session.borrow().end_reason(), Some(RunEndReason::ExpiredTap));

    let frames = session.borrow().frames();
    link.fire(render + 16.0);
    assert_eq!(session.borrow().frames(), frames);
}

#[test]
fn hold_followed_by_a_burst_on_its_lane_can_be_cleared() {
    let rules = Rules {
        burst_probability: 1.0,
        hold_probability: 1.0,
        hold_min_beats: 1.8,
        hold_max_beats: 1.8,
        hold_grace_beats: 0.0,
        ..scenario_rules()
    };
    let (mut session, handle) = start("0 0", rules);
    let mut pending: Vec<InputEvent> = Vec::new();
    let mut arrivals = Vec::new();
    let mut t = 0.0;
    while t <= 3_000.0 {
        for event in session.drain_events() {
            if let GameEvent::TileSpawned { lane, arrival_ms, .. } = event {
                arrivals.push((lane, arrival_ms));
                pending.push(InputEvent::press(lane, arrival_ms));
            }
        }
        let (due, later): (Vec<_>, Vec<_>) = pending.into_iter().partition(|e| e.timestamp <= t);
        pending = later;
        for event in due {
            session.queue_input(event);
        }
        assert_eq!(tick(&mut session, &handle, t), FrameOutcome::Continue, "at {t}ms");
        t += 10.0;
    }

    // Burst slots that would land inside a live hold are left out.
    assert_eq!(arrivals, vec![(0, 1_000.0), (0, 2_000.0), (0, 3_500.0)]);
    let run = session.run_state();
    assert_eq!((run.score, run.combo), (6, 2));
}

#[test]
fn lost_audio_clock_keeps_the_run_moving() {
    let (mut session, handle) = start("0", scenario_rules());
    tick(&mut session, &handle, 0.0);
    handle.disconnect();

    let mut render = 0.0;
    let mut outcome = FrameOutcome::Continue;
    while outcome == FrameOutcome::Continue && render < 5_000.0 {
        render += 16.0;
        outcome = session.frame(render);
    }

    assert_eq!(outcome, FrameOutcome::Ended(RunEndReason::ExpiredTap));
    assert!(session.now() >= 1_220.0 && session.now() < 1_240.0);
}
