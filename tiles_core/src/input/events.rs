use crate::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Tap or press-down.
    Press,
    /// Press-up; only meaningful while holding.
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    /// Song time (audio clock) when the event occurred
    pub timestamp: Millis,
    pub lane: u8,
    pub kind: InputKind,
}

impl InputEvent {
    pub fn press(lane: u8, timestamp: Millis) -> Self {
        Self {
            timestamp,
            lane,
            kind: InputKind::Press,
        }
    }

    pub fn release(lane: u8, timestamp: Millis) -> Self {
        Self {
            timestamp,
            lane,
            kind: InputKind::Release,
        }
    }
}

/// Keyboard layout: `a s d f` drive lanes 0-3.
pub fn key_to_lane(key: char) -> Option<u8> {
    match key.to_ascii_lowercase() {
        'a' => Some(0),
        's' => Some(1),
        'd' => Some(2),
        'f' => Some(3),
        _ => None,
    }
}
