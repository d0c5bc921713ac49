//! Per-viewer snapshots for broadcast.
//!
//! A snapshot is what one viewer is allowed to see. Concealed hands are
//! hidden except the viewer's own; once the game has ended every hand is
//! revealed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::state::{GamePhase, GameState};
use crate::core::{ActionType, EngineResult, Seat, Tile};
use crate::player::{MeldSet, PlayerStatus};

/// One player as seen by the viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub user_id: String,
    pub seat: Seat,
    pub is_dealer: bool,
    pub score: i64,
    pub status: PlayerStatus,
    /// Concealed tiles, when visible to the viewer.
    pub hand: Option<Vec<Tile>>,
    pub hand_count: usize,
    pub melds: Vec<MeldSet>,
    pub consecutive_timeouts: u32,
}

/// The open discard and who it is waiting on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingClaim {
    pub tile: Tile,
    pub discarder: Seat,
    pub awaiting: Vec<Seat>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub room_id: String,
    pub game_id: String,
    /// `None` for a spectator view.
    pub viewer: Option<String>,
    pub phase: GamePhase,
    pub players: Vec<PlayerView>,
    pub discard_pile: Vec<Tile>,
    pub remaining_tiles: usize,
    pub current_player_index: usize,
    pub dealer_seat_index: usize,
    pub turn_deadline: Option<u64>,
    pub turn_seq: u64,
    pub round_number: u32,
    pub total_turns: u32,
    /// The viewer's legal actions.
    pub available_actions: BTreeSet<ActionType>,
    pub pending_claim: Option<PendingClaim>,
}

impl GameSnapshot {
    pub fn to_bytes(&self) -> EngineResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> EngineResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// The viewer's own entry.
    #[must_use]
    pub fn me(&self) -> Option<&PlayerView> {
        let viewer = self.viewer.as_deref()?;
        self.players.iter().find(|p| p.user_id == viewer)
    }
}

impl GameState {
    /// Snapshot for `viewer`. Fails with `UnknownPlayer` if the viewer is
    /// not seated.
    pub fn snapshot(&self, viewer: &str) -> EngineResult<GameSnapshot> {
        let seat = self.seat_of(viewer)?;
        Ok(self.build_snapshot(Some((viewer, seat))))
    }

    /// Snapshot with every concealed hand hidden.
    #[must_use]
    pub fn public_snapshot(&self) -> GameSnapshot {
        self.build_snapshot(None)
    }

    fn build_snapshot(&self, viewer: Option<(&str, Seat)>) -> GameSnapshot {
        let reveal_all = self.phase >= GamePhase::Settlement;
        let viewer_seat = viewer.map(|(_, seat)| seat);

        let players = self
            .players
            .iter()
            .map(|p| PlayerView {
                user_id: p.user_id.clone(),
                seat: p.seat,
                is_dealer: p.is_dealer,
                score: p.score,
                status: p.status,
                hand: (reveal_all || viewer_seat == Some(p.seat)).then(|| p.hand().to_vec()),
                hand_count: p.hand_len(),
                melds: p.melds().to_vec(),
                consecutive_timeouts: p.consecutive_timeouts,
            })
            .collect();

        let available_actions = viewer_seat
            .and_then(|seat| self.player(seat))
            .map(|p| p.available_actions.clone())
            .unwrap_or_default();

        let pending_claim = self.claim_window().map(|window| PendingClaim {
            tile: window.tile(),
            discarder: window.discarder(),
            awaiting: window.pending_seats(),
        });

        GameSnapshot {
            room_id: self.room_id.clone(),
            game_id: self.game_id.clone(),
            viewer: viewer.map(|(id, _)| id.to_string()),
            phase: self.phase,
            players,
            discard_pile: self.discard_pile.clone(),
            remaining_tiles: self.wall.remaining(),
            current_player_index: self.current_player_index,
            dealer_seat_index: self.dealer_seat_index,
            turn_deadline: self.turn_deadline,
            turn_seq: self.turn_seq,
            round_number: self.round_number,
            total_turns: self.total_turns,
            available_actions,
            pending_claim,
        }
    }
}
