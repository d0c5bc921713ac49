//! Core engine types: tiles, seats, actions, errors, RNG, configuration, time.
//!
//! These are the leaf building blocks every other module depends on. They
//! carry no game flow of their own.

pub mod tile;
pub mod error;
pub mod seat;
pub mod rng;
pub mod config;
pub mod action;
pub mod clock;

pub use tile::{Suit, Tile, TileCounts, TileSet, COPIES_PER_TILE};
pub use error::{ActionRejection, EngineError, EngineResult};
pub use seat::{Seat, SeatMap};
pub use rng::GameRng;
pub use config::{RoomConfig, ScoreConfig, DEALER_HAND_SIZE, HAND_SIZE};
pub use action::{Action, ActionOrigin, ActionRequest, ActionType, GameAction};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
