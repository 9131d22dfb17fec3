pub mod events;
pub mod field;
pub mod judge;
pub mod run_state;
pub mod session;
pub mod spawn;

pub use events::{GameEvent, RunEndReason};
pub use field::{Tile, TileField, TileId, TileKind, TileView};
pub use judge::{JudgeMachine, JudgeOutcome, JudgeWindows, Judgment, Timing};
pub use run_state::RunState;
pub use session::{FrameOutcome, GameSession, SessionPhase};
pub use spawn::{SpawnScheduler, TravelRamp};
