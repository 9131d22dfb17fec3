use std::collections::BTreeMap;
use std::{env, fs};

use song_schema::{parse_pattern, DifficultyKey, DifficultyProfile, Song, SongCatalog};
use tiles_core::input::events::InputEvent;
use tiles_core::rules::Rules;
use tiles_core::store::MemoryHighScores;
use tiles_core::RunEndReason;
use tiles_runner::{
    load_catalog_from_path, load_script_from_path, simulate, spawn_timeline, InputPlan, SimulationConfig,
};

fn steady_song(pattern: &str) -> Song {
    Song {
        title: "Steady".to_string(),
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

fn steady_rules() -> Rules {
    Rules {
        travel_decay_per_beat: 0.0,
        ..Rules::default().deterministic()
    }
}

#[test]
fn autoplay_clears_a_builtin_song() {
    let catalog = SongCatalog::builtin();
    let song = catalog.find("acelerada").unwrap();
    let store = MemoryHighScores::new();
    let config = SimulationConfig {
        track_length_ms: 20_000.0,
        ..SimulationConfig::default()
    };

    let report = simulate(song, DifficultyKey::Hard, Rules::default(), &config, &store).unwrap();

    assert_eq!(report.summary.reason, RunEndReason::TrackComplete);
    assert!(report.tiles_spawned > 10);
    assert_eq!(report.judgments.total(), report.tiles_spawned);
    assert_eq!(report.judgments.perfect, report.tiles_spawned);
    assert_eq!(report.summary.score, 3 * report.tiles_spawned as u64);
    assert_eq!(report.summary.max_combo, report.tiles_spawned);
    assert!(report.summary.new_high_score);

    // Same seed, same run: not a new record the second time.
    let again = simulate(song, DifficultyKey::Hard, Rules::default(), &config, &store).unwrap();
    assert_eq!(again.summary.score, report.summary.score);
    assert_eq!(again.summary.previous_best, report.summary.score);
    assert!(!again.summary.new_high_score);
}

#[test]
fn idle_player_misses_the_first_tile() {
    let config = SimulationConfig {
        input: InputPlan::Idle,
        ..SimulationConfig::default()
    };
    let report = simulate(
        &steady_song("0 1"),
        DifficultyKey::Normal,
        steady_rules(),
        &config,
        &MemoryHighScores::new(),
    )
    .unwrap();

    assert_eq!(report.summary.reason, RunEndReason::ExpiredTap);
    assert_eq!(report.summary.score, 0);
    assert!(!report.summary.new_high_score);
    // Expires 220ms after the 1000ms arrival.
    assert!(report.frames < 80);
}

#[test]
fn scripted_inputs_are_judged_at_their_timestamps() {
    let config = SimulationConfig {
        input: InputPlan::Scripted(vec![InputEvent::press(0, 1_100.0), InputEvent::press(1, 2_000.0)]),
        ..SimulationConfig::default()
    };
    let report = simulate(
        &steady_song("0 1 2"),
        DifficultyKey::Normal,
        steady_rules(),
        &config,
        &MemoryHighScores::new(),
    )
    .unwrap();

    assert_eq!(report.judgments.great, 1);
    assert_eq!(report.judgments.perfect, 1);
    assert_eq!(report.summary.score, 5);
    assert_eq!(report.summary.max_combo, 2);
    assert_eq!(report.summary.reason, RunEndReason::ExpiredTap);
}

#[test]
fn unplayable_song_is_refused() {
    let mut song = steady_song("0");
    song.bpm = 0.0;
    let err = simulate(
        &song,
        DifficultyKey::Normal,
        steady_rules(),
        &SimulationConfig::default(),
        &MemoryHighScores::new(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("non-playable tempo"));
}

#[test]
fn timeline_follows_the_authored_pattern() {
    let rows = spawn_timeline(&steady_song("0 1 2+3"), DifficultyKey::Normal, &steady_rules(), 4).unwrap();
    let lanes: Vec<_> = rows.iter().map(|r| r.lanes.clone()).collect();
    assert_eq!(lanes, vec![vec![0], vec![1], vec![2, 3], vec![0]]);
    let due: Vec<_> = rows.iter().map(|r| r.due_ms).collect();
    assert_eq!(due, vec![0.0, 1_000.0, 2_000.0, 3_000.0]);
    assert_eq!(rows[1].arrival_ms, 2_000.0);
}

#[test]
fn loaders_report_the_failing_path() {
    let dir = env::temp_dir().join(format!("tiles_runner_loaders_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let missing = dir.join("missing.json");
    let _ = fs::remove_file(&missing);
    let err = load_catalog_from_path(&missing).unwrap_err();
    assert!(err.to_string().contains("failed to read catalog:"));

    let script = dir.join("script.json");
    fs::write(&script, r#"[{"lane": 1, "kind": "press", "at_ms": 500}]"#).unwrap();
    assert_eq!(load_script_from_path(&script).unwrap(), vec![InputEvent::press(1, 500.0)]);

    fs::write(&script, "[").unwrap();
    let err = load_script_from_path(&script).unwrap_err();
    assert!(err.to_string().contains("failed to parse input script:"));

    let _ = fs::remove_dir_all(&dir);
}
