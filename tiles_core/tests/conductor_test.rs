use tiles_core::time::{AudioClock, Conductor, NoClock, TimelineMode};

#[test]
fn test_conductor_interpolation() {
    let (clock, handle) = AudioClock::new();
    let mut conductor = Conductor::new(250.0);

    // Audio at 0ms when the render clock reads 10000ms.
    handle.publish(0.0);
    assert_eq!(conductor.sample(&clock, 10_000.0), 0.0);
    assert_eq!(conductor.mode(), TimelineMode::Audio);

    // Audio thread hasn't moved, but we extrapolate.
    assert_eq!(conductor.sample(&clock, 10_100.0), 100.0);

    // Audio advanced to 500ms; the next sample resyncs to it.
    handle.publish(500.0);
    assert_eq!(conductor.sample(&clock, 10_600.0), 500.0);
    assert_eq!(conductor.sample(&clock, 10_700.0), 600.0);
}

#[test]
fn test_late_audio_does_not_switch_timelines() {
    let (clock, handle) = AudioClock::new();
    let mut conductor = Conductor::new(250.0);

    assert_eq!(conductor.sample(&clock, 1_000.0), 0.0);
    assert!(matches!(conductor.mode(), TimelineMode::Synthetic { .. }));

    // Audio shows up later at a very different position; the run keeps its timeline.
    handle.publish(30_000.0);
    assert_eq!(conductor.sample(&clock, 1_500.0), 500.0);
    assert!(matches!(conductor.mode(), TimelineMode::Synthetic { .. }));
}

#[test]
fn test_pause_rebases_audio_extrapolation() {
    let (clock, handle) = AudioClock::new();
    let mut conductor = Conductor::new(250.0);
    handle.publish(2_000.0);
    conductor.sample(&clock, 0.0);
    assert_eq!(conductor.sample(&clock, 100.0), 2_100.0);

    // Audio is paused alongside the run, so its reading stays put.
    conductor.pause(100.0);
    conductor.resume(5_000.0);
    assert_eq!(conductor.sample(&clock, 5_010.0), 2_110.0);

    // A fresh reading after resume takes over again.
    handle.publish(2_150.0);
    assert_eq!(conductor.sample(&clock, 5_060.0), 2_150.0);
}

#[test]
fn test_no_clock_runs_from_the_first_frame() {
    let mut conductor = Conductor::new(250.0);
    assert_eq!(conductor.now(), None);
    assert_eq!(conductor.sample(&NoClock, 42.0), 0.0);
    assert_eq!(conductor.sample(&NoClock, 1_042.0), 1_000.0);
    assert_eq!(conductor.now(), Some(1_000.0));
}

#[test]
fn test_finished_track_keeps_time_running() {
    let (clock, handle) = AudioClock::new();
    let mut conductor = Conductor::new(250.0);
    handle.publish(29_990.0);
    conductor.sample(&clock, 0.0);
    handle.finish();

    assert_eq!(conductor.sample(&clock, 1_000.0), 30_990.0);
}
