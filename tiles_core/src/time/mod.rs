pub mod clock;
pub mod conductor;

pub use clock::{AudioClock, AudioClockHandle, ClockSource, NoClock};
pub use conductor::{Conductor, TimelineMode};
