//! The turn engine.
//!
//! [`GameState`] owns one game from deal to settlement:
//!
//! - `state`: phases, turn stages, lifecycle and invariants
//! - `process`: action validation and application
//! - `claim`: arbitration of responses to a discard
//! - `timeout`: deadlines, stale timers and auto-play
//! - `snapshot`: per-viewer views
//! - `record`: audit records and replay
//! - `event`: the event queue for broadcasters

pub mod builder;
pub mod claim;
pub mod event;
pub mod process;
pub mod record;
pub mod snapshot;
pub mod state;
pub mod timeout;

pub use builder::GameBuilder;
pub use claim::{claim_priority, ClaimResolution, ClaimResponse, ClaimWindow};
pub use event::GameEvent;
pub use record::GameRecord;
pub use snapshot::{GameSnapshot, PendingClaim, PlayerView};
pub use state::{ActionOutcome, GamePhase, GameState, TurnStage};
pub use timeout::TimeoutOutcome;
