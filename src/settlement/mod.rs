//! Round settlement: converts a finished game into per-player scores.

pub mod engine;
pub mod result;

pub use engine::{SettlementEngine, SettlementInput, SettlementSeat};
pub use result::{GameEndReason, GangRecord, PlayerResult, SettlementResult};
