//! Lane highlight effects as pure functions of elapsed time.
//!
//! Only the discrete hit events are stored; every fading value is computed
//! on demand from `now - event_time`, so there is nothing to decay per frame.

use song_schema::LANE_COUNT;

use crate::gameplay::events::GameEvent;
use crate::Millis;

pub const LANE_FLASH_MS: Millis = 120.0;
pub const GLOW_DECAY_MS: Millis = 220.0;
const GLOW_PER_POINT: f64 = 0.08;
const PULSE_PEAK: f64 = 0.45;
const PULSE_DECAY: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct LaneHit {
    at_ms: Millis,
    points: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneFeedback {
    last_hit: [Option<LaneHit>; LANE_COUNT],
}

impl LaneFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self, lane: u8, at_ms: Millis, points: u32) {
        if let Some(slot) = self.last_hit.get_mut(lane as usize) {
            *slot = Some(LaneHit { at_ms, points });
        }
    }

    /// Feeds a core event; only judgments matter here.
    pub fn observe(&mut self, event: &GameEvent) {
        if let GameEvent::Judged {
            lane, points, at_ms, ..
        } = event
        {
            self.record_hit(*lane, *at_ms, *points);
        }
    }

    fn age(&self, lane: u8, now: Millis) -> Option<(Millis, u32)> {
        let hit = (*self.last_hit.get(lane as usize)?)?;
        Some((now - hit.at_ms, hit.points))
    }

    pub fn flash_active(&self, lane: u8, now: Millis) -> bool {
        self.age(lane, now)
            .is_some_and(|(age, _)| (0.0..LANE_FLASH_MS).contains(&age))
    }

    /// Quality glow, stronger for better judgments, fading out over 220ms.
    pub fn glow_opacity(&self, lane: u8, now: Millis) -> f64 {
        match self.age(lane, now) {
            Some((age, points)) if age >= 0.0 => {
                GLOW_PER_POINT * points as f64 * (1.0 - age / GLOW_DECAY_MS).max(0.0)
            }
            _ => 0.0,
        }
    }
}

/// Whole-screen beat pulse: peaks on each beat and decays exponentially.
pub fn beat_pulse(now: Millis, start: Millis, beat_ms: Millis) -> f64 {
    if !(beat_ms > 0.0) {
        return 0.0;
    }
    let phase = (now - start).rem_euclid(beat_ms) / beat_ms;
    PULSE_PEAK * (-PULSE_DECAY * phase).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_and_glow_fade_with_age() {
        let mut feedback = LaneFeedback::new();
        assert!(!feedback.flash_active(1, 0.0));
        assert_eq!(feedback.glow_opacity(1, 0.0), 0.0);

        feedback.record_hit(1, 1_000.0, 3);
        assert!(feedback.flash_active(1, 1_000.0));
        assert!(feedback.flash_active(1, 1_119.0));
        assert!(!feedback.flash_active(1, 1_120.0));
        assert!(!feedback.flash_active(0, 1_010.0));

        assert!((feedback.glow_opacity(1, 1_000.0) - 0.24).abs() < 1e-12);
        assert!((feedback.glow_opacity(1, 1_110.0) - 0.12).abs() < 1e-12);
        assert_eq!(feedback.glow_opacity(1, 1_300.0), 0.0);
        // Same time, same answer.
        assert_eq!(feedback.glow_opacity(1, 1_050.0), feedback.glow_opacity(1, 1_050.0));
    }

    #[test]
    fn beat_pulse_peaks_on_the_beat() {
        assert!((beat_pulse(1_000.0, 0.0, 500.0) - 0.45).abs() < 1e-12);
        assert!(beat_pulse(1_250.0, 0.0, 500.0) < 0.03);
        assert_eq!(beat_pulse(10.0, 0.0, 0.0), 0.0);
    }
}
