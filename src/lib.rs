//! # mahjong-engine
//!
//! A server-authoritative engine for three-player Mahjong rooms.
//!
//! ## Design Principles
//!
//! 1. **Single Writer**: Each room's game is owned by one actor. The engine
//!    itself is synchronous, deterministic and free of I/O.
//!
//! 2. **Seeded Everything**: The wall shuffle and dealer choice come from a
//!    ChaCha8 stream keyed by the game seed, and time comes from an injected
//!    clock. A record of setup plus accepted actions replays exactly.
//!
//! 3. **Closed Actions**: Player actions are an enum matched exhaustively.
//!    A rejected action leaves the state untouched.
//!
//! ## Architecture
//!
//! - **Turn stages**: Within Playing, the engine waits either for the current
//!   player's discard or for responses to an open discard. Claims are
//!   arbitrated by a short-lived claim window.
//!
//! - **Cancellable timers**: Every accepted transition bumps a turn
//!   sequence number; timeouts armed under an older number are ignored.
//!
//! - **Invariant guard**: Tile conservation, hand sizes and seat indices are
//!   checked after every mutation. A violation aborts the game.
//!
//! ## Modules
//!
//! - `core`: Tiles, seats, actions, errors, RNG, configuration, clocks
//! - `wall`: The shuffled deck and its draw cursor
//! - `player`: Hands, melds and legality queries
//! - `rules`: Win detection and fan counting
//! - `game`: The turn engine, claim windows, timeouts, snapshots, replay
//! - `settlement`: Score computation for a finished game
//! - `room`: Per-room actors and their supervisor

pub mod core;
pub mod game;
pub mod player;
pub mod room;
pub mod rules;
pub mod settlement;
pub mod wall;

// Re-export commonly used types
pub use crate::core::{
    Action, ActionOrigin, ActionRejection, ActionRequest, ActionType, Clock, EngineError,
    EngineResult, GameAction, GameRng, ManualClock, RoomConfig, ScoreConfig, Seat, SeatMap,
    SharedClock, Suit, SystemClock, Tile, TileSet,
};

pub use crate::wall::TileWall;

pub use crate::player::{GangKind, MeldSet, MeldType, PlayerState, PlayerStatus};

pub use crate::rules::{HandType, WinContext, WinEvaluator, WinResult};

pub use crate::game::{
    ActionOutcome, ClaimWindow, GameBuilder, GameEvent, GamePhase, GameRecord, GameSnapshot,
    GameState, TimeoutOutcome, TurnStage,
};

pub use crate::settlement::{
    GameEndReason, GangRecord, PlayerResult, SettlementEngine, SettlementResult,
};

pub use crate::room::{RoomActor, RoomError, RoomHandle, RoomNotice, RoomSupervisor, TokioClock};
