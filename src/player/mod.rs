//! Per-player state: concealed hand, melds and legality queries.

pub mod meld;
pub mod state;

pub use meld::{GangKind, MeldSet, MeldType};
pub use state::{PlayerState, PlayerStatus};
