use song_schema::{DifficultyKey, Song, LANE_COUNT};
use tiles_runner::{SimulationReport, TimelineRow};

pub fn print_timeline(song: &Song, difficulty: DifficultyKey, rows: &[TimelineRow]) {
    if rows.is_empty() {
        println!("Timeline is empty.");
        return;
    }

    let beat_ms = song.beat_ms().unwrap_or_default();
    println!(
        "Timeline: {} [{}] {:.1} bpm ({:.1} ms/beat)",
        song.title, difficulty, song.bpm, beat_ms
    );
    println!("Slot | Beat |  Due(ms) | Arrive(ms) | 0 1 2 3 | Info");
    println!("-----|------|----------|------------|---------|------------------");

    let mut previous_beat: Option<u64> = None;
    for row in rows {
        // 'N' tap, 'H' hold head, '.' empty
        let mut lane_chars = ['.'; LANE_COUNT];
        let ch = if row.hold_ms > 0.0 { 'H' } else { 'N' };
        for &lane in &row.lanes {
            if let Some(slot) = lane_chars.get_mut(lane as usize) {
                *slot = ch;
            }
        }
        let lane_str = lane_chars
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        let mut info_parts = Vec::new();
        if row.lanes.len() > 1 {
            info_parts.push("chord".to_string());
        }
        if row.hold_ms > 0.0 {
            info_parts.push(format!("hold {:.0}ms", row.hold_ms));
        }
        if previous_beat.is_some_and(|prev| row.beat - prev == 1) {
            info_parts.push("burst".to_string());
        }
        if row.lanes.is_empty() {
            info_parts.push("dropped".to_string());
        }
        previous_beat = Some(row.beat);

        println!(
            "{:4} | {:4} | {:8.1} | {:10.1} | {} | {}",
            row.slot,
            row.beat,
            row.due_ms,
            row.arrival_ms,
            lane_str,
            info_parts.join(", ")
        );
    }
}

pub fn print_report(report: &SimulationReport) {
    let summary = &report.summary;
    println!("{} [{}]", summary.title, summary.difficulty);
    println!("Result:    {}", summary.reason);
    println!("Score:     {}", summary.score);
    println!("Max combo: {}", summary.max_combo);
    println!(
        "Judgments: PERFECT {} / GREAT {} / GOOD {}",
        report.judgments.perfect, report.judgments.great, report.judgments.good
    );
    println!("Tiles:     {} ({} holds)", report.tiles_spawned, report.holds_started);
    println!("Frames:    {}", report.frames);
    if summary.new_high_score {
        println!("New high score! (previous best {})", summary.previous_best);
    } else {
        println!("High score: {}", summary.previous_best);
    }
}
