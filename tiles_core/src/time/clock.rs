use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use atomic_float::AtomicF64;

use crate::Millis;

/// Read side of the audio playback transport.
///
/// Readings may be stale (the audio callback runs on its own cadence) or
/// missing altogether; the conductor smooths over both.
pub trait ClockSource {
    /// Current playback position, `None` while no audio clock is available.
    fn position_ms(&self) -> Option<Millis>;
    /// Playback reached the end of the track.
    fn is_finished(&self) -> bool;
}

struct Shared {
    position_ms: AtomicF64,
    available: AtomicBool,
    finished: AtomicBool,
}

/// Clock backed by atomics that the audio collaborator publishes into.
#[derive(Clone)]
pub struct AudioClock {
    shared: Arc<Shared>,
}

/// Write side handed to the audio callback.
#[derive(Clone)]
pub struct AudioClockHandle {
    shared: Arc<Shared>,
}

impl AudioClock {
    pub fn new() -> (Self, AudioClockHandle) {
        let shared = Arc::new(Shared {
            position_ms: AtomicF64::new(0.0),
            available: AtomicBool::new(false),
            finished: AtomicBool::new(false),
        });
        (
            Self {
                shared: shared.clone(),
            },
            AudioClockHandle { shared },
        )
    }
}

impl ClockSource for AudioClock {
    fn position_ms(&self) -> Option<Millis> {
        if self.shared.available.load(Ordering::Acquire) {
            Some(self.shared.position_ms.load(Ordering::Acquire))
        } else {
            None
        }
    }

    fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }
}

impl AudioClockHandle {
    /// Publishes a playback position update. Can be called from the audio thread.
    pub fn publish(&self, position_ms: Millis) {
        self.shared.position_ms.store(position_ms, Ordering::Release);
        self.shared.available.store(true, Ordering::Release);
    }

    /// Signals that the track played to the end.
    pub fn finish(&self) {
        self.shared.finished.store(true, Ordering::Release);
    }

    /// Marks the clock unavailable, e.g. after the audio device went away.
    pub fn disconnect(&self) {
        self.shared.available.store(false, Ordering::Release);
    }
}

/// A clock that never reports a position; runs fall back to the synthetic timeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClock;

impl ClockSource for NoClock {
    fn position_ms(&self) -> Option<Millis> {
        None
    }

    fn is_finished(&self) -> bool {
        false
    }
}

impl<T: ClockSource + ?Sized> ClockSource for Box<T> {
    fn position_ms(&self) -> Option<Millis> {
        (**self).position_ms()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}
