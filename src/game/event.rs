//! Game events.
//!
//! Events describe what happened, in order, so an outer layer can push
//! updates to clients without diffing snapshots. The engine queues them on
//! the game state; callers take them with `GameState::drain_events`.
//!
//! Events are server-side: `TileDrawn` carries the drawn tile, so a
//! broadcaster must filter it per viewer.

use serde::{Deserialize, Serialize};

use crate::core::{Seat, Tile};
use crate::player::{GangKind, MeldType};
use crate::settlement::GameEndReason;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Initial hands dealt.
    Dealt { dealer: Seat, remaining: usize },

    TileDrawn {
        seat: Seat,
        tile: Tile,
        /// Drawn as a gang replacement.
        replacement: bool,
    },

    Discarded { seat: Seat, tile: Tile },

    /// A discard is open to claims from these seats.
    ClaimWindowOpened {
        tile: Tile,
        discarder: Seat,
        claimants: Vec<Seat>,
    },

    /// A discard was taken into a meld.
    Claimed {
        seat: Seat,
        meld_type: MeldType,
        tile: Tile,
        from: Seat,
    },

    GangDeclared { seat: Seat, kind: GangKind, tile: Tile },

    TurnStarted { seat: Seat, turn_seq: u64, deadline: u64 },

    TrusteeEntered { seat: Seat },
    TrusteeExited { seat: Seat },

    Won {
        seat: Seat,
        tile: Tile,
        self_draw: bool,
        base_fan: u32,
    },

    GameEnded { reason: GameEndReason },

    Settled,

    /// A state invariant broke and the game was aborted.
    InvariantViolated { reason: String },
}
