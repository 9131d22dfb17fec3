//! Core of a four-lane rhythm tap game: timing, spawning, judgment and the
//! per-frame loop. Rendering, audio output and persistence backends live
//! outside; they talk to the core through [`time::ClockSource`], the input
//! queue, [`store::HighScoreStore`] and the [`gameplay::GameEvent`] stream.

pub mod beat;
pub mod error;
pub mod feedback;
pub mod frame;
pub mod gameplay;
pub mod input;
pub mod rules;
pub mod store;
pub mod time;

/// Song time and render time, in milliseconds.
pub type Millis = f64;

pub use error::{SessionError, SessionErrorKind, StoreError};
pub use gameplay::{FrameOutcome, GameEvent, GameSession, Judgment, RunEndReason};
pub use rules::{PerformancePreset, Rules, WrongInputPolicy};
