//! One player's hand, melds, status and timers.
//!
//! `PlayerState` answers legality questions ("can this player Peng 5W?") but
//! never decides turn order; that is the turn engine's job.
//!
//! ## Hand ordering
//!
//! The concealed hand is always sorted by suit, then rank. `add_tile`
//! inserts at the sorted position, so snapshots and auto-play never need to
//! re-sort.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::meld::{GangKind, MeldSet, MeldType};
use crate::core::{ActionRejection, ActionType, EngineError, EngineResult, Seat, Tile, COPIES_PER_TILE};

/// Player lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerStatus {
    /// Seated, game not started.
    #[default]
    Waiting,
    /// In the game, not the player to act.
    WaitingTurn,
    /// The player to act.
    Playing,
    /// Auto-played by the engine after repeated timeouts.
    Trustee,
    /// Game over.
    Finished,
}

/// One seat's state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub user_id: String,
    pub seat: Seat,
    hand_tiles: Vec<Tile>,
    melds: Vec<MeldSet>,
    pub is_dealer: bool,
    pub score: i64,
    pub status: PlayerStatus,
    pub consecutive_timeouts: u32,
    pub last_drawn_tile: Option<Tile>,
    pub available_actions: BTreeSet<ActionType>,
    pub last_action_time: Option<u64>,
}

impl PlayerState {
    #[must_use]
    pub fn new(user_id: impl Into<String>, seat: Seat) -> Self {
        Self {
            user_id: user_id.into(),
            seat,
            hand_tiles: Vec::with_capacity(14),
            melds: Vec::new(),
            is_dealer: false,
            score: 0,
            status: PlayerStatus::Waiting,
            consecutive_timeouts: 0,
            last_drawn_tile: None,
            available_actions: BTreeSet::new(),
            last_action_time: None,
        }
    }

    /// Concealed tiles, sorted.
    #[must_use]
    pub fn hand(&self) -> &[Tile] {
        &self.hand_tiles
    }

    #[must_use]
    pub fn melds(&self) -> &[MeldSet] {
        &self.melds
    }

    #[must_use]
    pub fn hand_len(&self) -> usize {
        self.hand_tiles.len()
    }

    /// Copies of `tile` in the concealed hand.
    #[must_use]
    pub fn count(&self, tile: Tile) -> usize {
        // The hand is sorted, so the copies form one contiguous run.
        let start = self.hand_tiles.partition_point(|t| *t < tile);
        self.hand_tiles[start..]
            .iter()
            .take_while(|t| **t == tile)
            .count()
    }

    /// Hand length plus three per meld. A gang counts as three.
    #[must_use]
    pub fn effective_hand_size(&self) -> usize {
        self.hand_tiles.len() + 3 * self.melds.len()
    }

    /// Every tile this player holds, concealed or melded.
    #[must_use]
    pub fn tiles_held(&self) -> usize {
        self.hand_tiles.len() + self.melds.iter().map(MeldSet::tile_count).sum::<usize>()
    }

    /// Insert a tile at its sorted position.
    pub fn add_tile(&mut self, tile: Tile) {
        let pos = self.hand_tiles.partition_point(|t| *t <= tile);
        self.hand_tiles.insert(pos, tile);
    }

    /// Remove one copy of `tile`.
    pub fn remove_tile(&mut self, tile: Tile) -> EngineResult<()> {
        self.remove_tiles(tile, 1)
    }

    /// Remove `n` copies of `tile`, or none if fewer are held.
    pub fn remove_tiles(&mut self, tile: Tile, n: usize) -> EngineResult<()> {
        let start = self.hand_tiles.partition_point(|t| *t < tile);
        if self.count(tile) < n {
            return Err(EngineError::InvalidAction(ActionRejection::TileNotHeld(tile)));
        }
        self.hand_tiles.drain(start..start + n);
        if n > 0 && self.last_drawn_tile == Some(tile) && self.count(tile) == 0 {
            self.last_drawn_tile = None;
        }
        Ok(())
    }

    pub fn add_meld(&mut self, meld: MeldSet) {
        self.melds.push(meld);
    }

    /// Two copies in hand.
    #[must_use]
    pub fn can_peng(&self, tile: Tile) -> bool {
        self.count(tile) >= 2
    }

    /// Three copies in hand, for a claimed (Ming) gang.
    #[must_use]
    pub fn can_gang(&self, tile: Tile) -> bool {
        self.count(tile) >= 3
    }

    /// All four copies in hand.
    #[must_use]
    pub fn can_concealed_gang(&self, tile: Tile) -> bool {
        self.count(tile) == COPIES_PER_TILE
    }

    /// An exposed Peng of `tile` and the fourth copy in hand.
    #[must_use]
    pub fn can_upgrade_gang(&self, tile: Tile) -> bool {
        self.count(tile) >= 1 && self.melds.iter().any(|m| m.is_peng_of(tile))
    }

    #[must_use]
    pub fn can_chi(&self, tile: Tile) -> bool {
        !self.chi_sequences(tile).is_empty()
    }

    /// Every run containing `tile` whose other two tiles are held.
    ///
    /// ```
    /// use mahjong_engine::core::{Seat, Tile};
    /// use mahjong_engine::player::PlayerState;
    ///
    /// let mut player = PlayerState::new("alice", Seat::new(0));
    /// for t in Tile::parse_list("2W 3W 5W").unwrap() {
    ///     player.add_tile(t);
    /// }
    /// let runs = player.chi_sequences("4W".parse().unwrap());
    /// assert_eq!(runs.len(), 2); // 2-3-4 and 3-4-5
    /// ```
    #[must_use]
    pub fn chi_sequences(&self, tile: Tile) -> SmallVec<[[Tile; 3]; 3]> {
        let mut runs = SmallVec::new();
        for (a, b) in [(-2, -1), (-1, 1), (1, 2)] {
            let (Some(x), Some(y)) = (tile.offset(a), tile.offset(b)) else {
                continue;
            };
            if self.count(x) >= 1 && self.count(y) >= 1 {
                let mut run = [x, y, tile];
                run.sort();
                runs.push(run);
            }
        }
        runs
    }

    /// Tiles held four times, in hand order.
    #[must_use]
    pub fn concealed_gang_candidates(&self) -> Vec<Tile> {
        let mut tiles: Vec<Tile> = self
            .hand_tiles
            .iter()
            .copied()
            .filter(|&t| self.can_concealed_gang(t))
            .collect();
        tiles.dedup();
        tiles
    }

    /// Exposed Pengs whose fourth copy is in hand.
    #[must_use]
    pub fn upgrade_gang_candidates(&self) -> Vec<Tile> {
        self.melds
            .iter()
            .filter(|m| m.meld_type == MeldType::Peng)
            .map(MeldSet::key_tile)
            .filter(|&t| self.count(t) >= 1)
            .collect()
    }

    /// Move the fourth copy of `tile` from hand onto the matching Peng.
    pub fn upgrade_peng(&mut self, tile: Tile) -> EngineResult<()> {
        let idx = self
            .melds
            .iter()
            .position(|m| m.is_peng_of(tile))
            .ok_or(EngineError::InvalidAction(ActionRejection::NoPengToUpgrade(tile)))?;
        self.remove_tile(tile)?;
        self.melds[idx].upgrade_to_gang();
        Ok(())
    }

    /// Number of gangs of the given kind.
    #[must_use]
    pub fn gang_count(&self, kind: GangKind) -> usize {
        self.melds
            .iter()
            .filter(|m| m.meld_type == MeldType::Gang(kind))
            .count()
    }

    /// Highest tile in hand. Used for auto-discard.
    #[must_use]
    pub fn highest_tile(&self) -> Option<Tile> {
        self.hand_tiles.last().copied()
    }

    #[must_use]
    pub fn is_trustee(&self) -> bool {
        self.status == PlayerStatus::Trustee
    }

    /// Record a timeout. Returns `true` only on the call that enters trustee
    /// mode.
    pub fn increment_timeouts(&mut self, threshold: u32) -> bool {
        self.consecutive_timeouts = self.consecutive_timeouts.saturating_add(1);
        if self.consecutive_timeouts >= threshold && self.status != PlayerStatus::Trustee {
            self.status = PlayerStatus::Trustee;
            return true;
        }
        false
    }

    /// Record a genuine action. Resets the timeout counter and leaves
    /// trustee mode. Returns `true` if the player was in trustee mode.
    pub fn update_last_action_time(&mut self, now: u64) -> bool {
        self.last_action_time = Some(now);
        self.consecutive_timeouts = 0;
        if self.status == PlayerStatus::Trustee {
            self.status = PlayerStatus::WaitingTurn;
            return true;
        }
        false
    }

    pub fn reset_for_new_game(&mut self) {
        self.hand_tiles.clear();
        self.melds.clear();
        self.is_dealer = false;
        self.score = 0;
        self.status = PlayerStatus::Waiting;
        self.consecutive_timeouts = 0;
        self.last_drawn_tile = None;
        self.available_actions.clear();
        self.last_action_time = None;
    }
}
