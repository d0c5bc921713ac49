//! Room runtime: one single-writer actor per room.
//!
//! - `actor`: owns a [`GameState`](crate::game::GameState), drains the inbox
//!   and fires turn timers
//! - `handle`: cloneable async front end to an actor
//! - `supervisor`: spawns and tracks rooms by id
//! - `clock`: time source that follows the tokio timer
//!
//! The engine itself is synchronous and does no I/O; this module is the only
//! place that touches the async runtime.

pub mod actor;
pub mod clock;
pub mod handle;
pub mod messages;
pub mod supervisor;

pub use actor::{RoomActor, DEFAULT_INBOX_CAPACITY};
pub use clock::TokioClock;
pub use handle::RoomHandle;
pub use messages::{RoomError, RoomMessage, RoomNotice};
pub use supervisor::RoomSupervisor;
