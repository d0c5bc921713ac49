//! Game state and turn lifecycle.
//!
//! ## Phases
//!
//! `Waiting → Playing → Settlement → Finished`. Every transition checks the
//! current phase, so phases never move backwards.
//!
//! ## Turn stages
//!
//! While Playing, [`TurnStage`] tracks what the engine waits for:
//!
//! - `Discard`: the current player holds 14 (counting melds as three) and
//!   must discard, declare a gang, or declare a self-drawn Hu
//! - `Claim`: a discard is open and the other players may respond
//!
//! There is no draw stage. When a discard goes unclaimed the engine rotates
//! the turn and draws for the next player itself; an empty wall at that
//! point ends the game in a draw.
//!
//! ## Invariants
//!
//! Checked after every accepted mutation. A violation aborts the game: the
//! state is marked faulted, an `InvariantViolated` event is queued, and every
//! later mutation fails with `GameAborted`.

use std::collections::BTreeSet;

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, error, info};

use super::claim::ClaimWindow;
use super::event::GameEvent;
use crate::core::{
    ActionRejection, ActionType, Clock, EngineError, EngineResult, GameAction, RoomConfig, ScoreConfig,
    Seat, SharedClock, Tile, DEALER_HAND_SIZE, HAND_SIZE,
};
use crate::player::{PlayerState, PlayerStatus};
use crate::rules::{WinEvaluator, WinResult};
use crate::settlement::{
    GameEndReason, GangRecord, SettlementEngine, SettlementInput, SettlementResult,
};
use crate::wall::TileWall;

/// Game lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    Waiting,
    Playing,
    Settlement,
    Finished,
}

/// What the engine is waiting for during Playing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnStage {
    Discard,
    Claim(ClaimWindow),
}

/// Result of an accepted action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// The action took effect and play continues.
    Applied,
    /// A claim window is open and waiting for more responses.
    ClaimPending,
    /// The action ended the game.
    GameEnded(GameEndReason),
}

/// Complete state of one game in one room.
///
/// Mutated only through action processing ([`GameState::apply`] and the
/// `process_*` methods), timeout handling and the lifecycle methods. Create
/// one with [`GameBuilder`](super::GameBuilder).
#[derive(Clone, Debug)]
pub struct GameState {
    pub(super) room_id: String,
    pub(super) game_id: String,
    pub(super) phase: GamePhase,
    pub(super) players: Vec<PlayerState>,
    pub(super) current_player_index: usize,
    pub(super) dealer_seat_index: usize,
    pub(super) discard_pile: Vec<Tile>,
    pub(super) wall: TileWall,
    pub(super) stage: TurnStage,
    pub(super) turn_start_time: Option<u64>,
    pub(super) turn_deadline: Option<u64>,
    pub(super) turn_seq: u64,
    pub(super) round_number: u32,
    pub(super) total_turns: u32,
    pub(super) player_action_counts: FxHashMap<String, u32>,
    pub(super) random_seed: u64,
    pub(super) stacked_wall: Option<Vec<Tile>>,
    pub(super) gang_records: Vec<GangRecord>,
    pub(super) win_results: Vec<WinResult>,
    pub(super) end_reason: Option<GameEndReason>,
    pub(super) game_start_time: Option<u64>,
    pub(super) game_end_time: Option<u64>,
    pub(super) action_log: Vector<GameAction>,
    pub(super) events: Vec<GameEvent>,
    pub(super) fault: Option<String>,
    pub(super) settlement: Option<SettlementResult>,
    pub(super) room_config: RoomConfig,
    pub(super) score_config: ScoreConfig,
    pub(super) evaluator: WinEvaluator,
    pub(super) clock: SharedClock,
    /// The current player's last draw was a gang replacement.
    pub(super) after_gang: bool,
    /// The open discard was made right after its discarder's gang.
    pub(super) gang_discharge: bool,
}

impl GameState {
    // === Accessors ===

    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn stage(&self) -> &TurnStage {
        &self.stage
    }

    /// The open claim window, if any.
    #[must_use]
    pub fn claim_window(&self) -> Option<&ClaimWindow> {
        match &self.stage {
            TurnStage::Claim(window) => Some(window),
            TurnStage::Discard => None,
        }
    }

    /// Players in seat order.
    #[must_use]
    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    #[must_use]
    pub fn player(&self, seat: Seat) -> Option<&PlayerState> {
        self.players.get(seat.index())
    }

    #[must_use]
    pub fn player_by_user(&self, user_id: &str) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    /// Seat of `user_id`, or `InvalidAction(UnknownPlayer)`.
    pub fn seat_of(&self, user_id: &str) -> EngineResult<Seat> {
        self.player_by_user(user_id)
            .map(|p| p.seat)
            .ok_or_else(|| ActionRejection::UnknownPlayer(user_id.to_string()).into())
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn current_player_index(&self) -> usize {
        self.current_player_index
    }

    #[must_use]
    pub fn current_seat(&self) -> Seat {
        Seat(self.current_player_index as u8)
    }

    #[must_use]
    pub fn dealer_seat_index(&self) -> usize {
        self.dealer_seat_index
    }

    /// Discards, oldest first. An open discard is the last entry.
    #[must_use]
    pub fn discard_pile(&self) -> &[Tile] {
        &self.discard_pile
    }

    #[must_use]
    pub fn wall(&self) -> &TileWall {
        &self.wall
    }

    #[must_use]
    pub fn remaining_tiles(&self) -> usize {
        self.wall.remaining()
    }

    #[must_use]
    pub fn turn_start_time(&self) -> Option<u64> {
        self.turn_start_time
    }

    #[must_use]
    pub fn turn_deadline(&self) -> Option<u64> {
        self.turn_deadline
    }

    /// Bumped by every accepted transition. Timers carry the value they were
    /// armed with so stale ones can be told apart.
    #[must_use]
    pub fn turn_seq(&self) -> u64 {
        self.turn_seq
    }

    #[must_use]
    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    #[must_use]
    pub fn total_turns(&self) -> u32 {
        self.total_turns
    }

    /// Accepted actions per user.
    #[must_use]
    pub fn player_action_counts(&self) -> &FxHashMap<String, u32> {
        &self.player_action_counts
    }

    #[must_use]
    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    #[must_use]
    pub fn gang_records(&self) -> &[GangRecord] {
        &self.gang_records
    }

    #[must_use]
    pub fn win_results(&self) -> &[WinResult] {
        &self.win_results
    }

    #[must_use]
    pub fn end_reason(&self) -> Option<GameEndReason> {
        self.end_reason
    }

    #[must_use]
    pub fn game_start_time(&self) -> Option<u64> {
        self.game_start_time
    }

    #[must_use]
    pub fn game_end_time(&self) -> Option<u64> {
        self.game_end_time
    }

    /// Accepted actions in order.
    #[must_use]
    pub fn action_log(&self) -> &Vector<GameAction> {
        &self.action_log
    }

    /// The stored settlement, once `settle` has run.
    #[must_use]
    pub fn settlement(&self) -> Option<&SettlementResult> {
        self.settlement.as_ref()
    }

    #[must_use]
    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    #[must_use]
    pub fn fault_reason(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    #[must_use]
    pub fn room_config(&self) -> &RoomConfig {
        &self.room_config
    }

    #[must_use]
    pub fn score_config(&self) -> &ScoreConfig {
        &self.score_config
    }

    #[must_use]
    pub fn evaluator(&self) -> &WinEvaluator {
        &self.evaluator
    }

    /// The time source deadlines are measured against.
    #[must_use]
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Take every queued event.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Internal helpers ===

    pub(super) fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    pub(super) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(super) fn seat_player(&self, seat: Seat) -> &PlayerState {
        &self.players[seat.index()]
    }

    pub(super) fn seat_player_mut(&mut self, seat: Seat) -> &mut PlayerState {
        &mut self.players[seat.index()]
    }

    /// Fail with `GameAborted` once the game is faulted.
    pub(super) fn ensure_live(&self) -> EngineResult<()> {
        match &self.fault {
            Some(reason) => Err(EngineError::GameAborted(reason.clone())),
            None => Ok(()),
        }
    }

    /// Mark the game faulted and build the error to return.
    pub(super) fn abort(&mut self, reason: String) -> EngineError {
        error!(
            room_id = %self.room_id,
            game_id = %self.game_id,
            turn_seq = self.turn_seq,
            %reason,
            "Invariant violated, aborting game"
        );
        self.fault = Some(reason.clone());
        self.turn_deadline = None;
        self.emit(GameEvent::InvariantViolated {
            reason: reason.clone(),
        });
        EngineError::InvariantViolation(reason)
    }

    /// Check invariants; abort the game if one fails.
    pub(super) fn guard_invariants(&mut self) -> EngineResult<()> {
        match self.check_invariants() {
            Ok(()) => Ok(()),
            Err(reason) => Err(self.abort(reason)),
        }
    }

    /// Seats the engine is waiting on.
    pub(super) fn awaited_seats(&self) -> SmallVec<[Seat; 3]> {
        match &self.stage {
            TurnStage::Discard => SmallVec::from_slice(&[self.current_seat()]),
            TurnStage::Claim(window) => window.pending_seats().into_iter().collect(),
        }
    }

    /// Start the clock for whoever must act next.
    ///
    /// The deadline uses the trustee delay when every awaited player is in
    /// trustee mode.
    pub(super) fn start_turn_timer(&mut self, now: u64) {
        let awaited = self.awaited_seats();
        let all_trustee = !awaited.is_empty()
            && awaited.iter().all(|&s| self.seat_player(s).is_trustee());
        let limit = if all_trustee {
            self.room_config.trustee_delay_ms
        } else {
            self.room_config.turn_time_limit_ms
        };
        let deadline = now + limit;
        self.turn_start_time = Some(now);
        self.turn_deadline = Some(deadline);
        self.turn_seq += 1;
        self.emit(GameEvent::TurnStarted {
            seat: self.current_seat(),
            turn_seq: self.turn_seq,
            deadline,
        });
    }

    /// Current player `Playing`, others `WaitingTurn`. Trustee players keep
    /// their status.
    pub(super) fn sync_statuses(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        let current = self.current_player_index;
        for (i, player) in self.players.iter_mut().enumerate() {
            if player.status == PlayerStatus::Trustee {
                continue;
            }
            player.status = if i == current {
                PlayerStatus::Playing
            } else {
                PlayerStatus::WaitingTurn
            };
        }
    }

    /// Recompute every player's legal action set.
    pub(super) fn refresh_available_actions(&mut self) {
        let mut sets: SmallVec<[(Seat, BTreeSet<ActionType>); 3]> = SmallVec::new();
        if self.phase == GamePhase::Playing {
            match &self.stage {
                TurnStage::Discard => {
                    let player = self.seat_player(self.current_seat());
                    let mut set = BTreeSet::from([ActionType::Discard]);
                    if player.last_drawn_tile.is_some()
                        && self.evaluator.is_winning(player.hand(), player.melds())
                    {
                        set.insert(ActionType::Hu);
                    }
                    if self.room_config.allow_gang
                        && (!player.concealed_gang_candidates().is_empty()
                            || !player.upgrade_gang_candidates().is_empty())
                    {
                        set.insert(ActionType::Gang);
                    }
                    sets.push((player.seat, set));
                }
                TurnStage::Claim(window) => {
                    for seat in window.pending_seats() {
                        let mut set = window.options(seat).clone();
                        set.insert(ActionType::Pass);
                        sets.push((seat, set));
                    }
                }
            }
        }

        for player in &mut self.players {
            player.available_actions.clear();
        }
        for (seat, set) in sets {
            self.seat_player_mut(seat).available_actions = set;
        }
    }

    // === Lifecycle ===

    /// Deal the opening hands: Waiting → Playing.
    ///
    /// The dealer draws 14, then each following seat draws 13. The dealer's
    /// 14th tile counts as its drawn tile, so it may declare a self-drawn Hu
    /// at once.
    pub fn deal_initial_tiles(&mut self) -> EngineResult<()> {
        self.ensure_live()?;
        if self.phase != GamePhase::Waiting {
            return Err(EngineError::transition(self.phase, "deal"));
        }
        let needed = self.room_config.dealt_tiles();
        if self.wall.remaining() < needed {
            return Err(EngineError::InsufficientTiles {
                requested: needed,
                remaining: self.wall.remaining(),
            });
        }

        let now = self.now();
        let n = self.player_count();
        let dealer = Seat(self.dealer_seat_index as u8);

        let dealer_hand = self.wall.draw_many(DEALER_HAND_SIZE)?;
        let last = dealer_hand.last().copied();
        for tile in dealer_hand {
            self.seat_player_mut(dealer).add_tile(tile);
        }
        self.seat_player_mut(dealer).last_drawn_tile = last;

        for seat in Seat::after(dealer, n) {
            for tile in self.wall.draw_many(HAND_SIZE)? {
                self.seat_player_mut(seat).add_tile(tile);
            }
        }

        self.phase = GamePhase::Playing;
        self.game_start_time = Some(now);
        self.current_player_index = dealer.index();
        self.stage = TurnStage::Discard;
        self.total_turns = 1;
        self.sync_statuses();

        self.emit(GameEvent::Dealt {
            dealer,
            remaining: self.wall.remaining(),
        });
        self.start_turn_timer(now);
        self.refresh_available_actions();

        info!(
            room_id = %self.room_id,
            game_id = %self.game_id,
            dealer = dealer.index(),
            remaining = self.wall.remaining(),
            "Initial tiles dealt"
        );
        self.guard_invariants()
    }

    /// Rotate the turn to the next seat.
    pub(crate) fn next_turn(&mut self) -> Seat {
        self.current_player_index = (self.current_player_index + 1) % self.player_count();
        self.total_turns += 1;
        self.sync_statuses();
        self.current_seat()
    }

    /// Draw for the current player. Ends the game in a draw on an empty wall.
    pub(super) fn draw_for_current(&mut self, replacement: bool, now: u64) -> EngineResult<ActionOutcome> {
        let Ok(tile) = self.wall.draw() else {
            self.end_game_at(GameEndReason::Draw, now)?;
            return Ok(ActionOutcome::GameEnded(GameEndReason::Draw));
        };
        let seat = self.current_seat();
        let player = self.seat_player_mut(seat);
        player.add_tile(tile);
        player.last_drawn_tile = Some(tile);
        self.after_gang = replacement;

        debug!(
            room_id = %self.room_id,
            seat = seat.index(),
            %tile,
            replacement,
            remaining = self.wall.remaining(),
            "Tile drawn"
        );
        self.emit(GameEvent::TileDrawn {
            seat,
            tile,
            replacement,
        });
        self.start_turn_timer(now);
        self.refresh_available_actions();
        Ok(ActionOutcome::Applied)
    }

    /// Pass the turn on after an unclaimed discard and draw for the next
    /// player.
    pub(super) fn advance_turn(&mut self, now: u64) -> EngineResult<ActionOutcome> {
        self.next_turn();
        if self.should_end_game() {
            self.end_game_at(GameEndReason::Draw, now)?;
            return Ok(ActionOutcome::GameEnded(GameEndReason::Draw));
        }
        self.draw_for_current(false, now)
    }

    /// Whether the game is over: a Hu was accepted, or the wall is empty and
    /// the player to move still needs a draw.
    #[must_use]
    pub fn should_end_game(&self) -> bool {
        if !self.win_results.is_empty() {
            return true;
        }
        let needs_draw = self.phase == GamePhase::Playing
            && matches!(self.stage, TurnStage::Discard)
            && self.seat_player(self.current_seat()).effective_hand_size() == HAND_SIZE;
        self.wall.is_empty() && needs_draw
    }

    /// End the game: Playing → Settlement.
    pub fn end_game(&mut self, reason: GameEndReason) -> EngineResult<()> {
        self.ensure_live()?;
        let now = self.now();
        self.end_game_at(reason, now)?;
        self.turn_seq += 1;
        Ok(())
    }

    pub(super) fn end_game_at(&mut self, reason: GameEndReason, now: u64) -> EngineResult<()> {
        if self.phase != GamePhase::Playing {
            return Err(EngineError::transition(self.phase, "end the game"));
        }
        self.phase = GamePhase::Settlement;
        self.stage = TurnStage::Discard;
        self.end_reason = Some(reason);
        self.game_end_time = Some(now);
        self.turn_deadline = None;
        for player in &mut self.players {
            player.status = PlayerStatus::Finished;
            player.available_actions.clear();
        }
        self.emit(GameEvent::GameEnded { reason });
        info!(
            room_id = %self.room_id,
            game_id = %self.game_id,
            ?reason,
            winners = self.win_results.len(),
            remaining = self.wall.remaining(),
            "Game ended"
        );
        Ok(())
    }

    /// Run settlement: Settlement → Finished.
    ///
    /// Applies the capped scores to the players and stores the result.
    /// Calling again after the game is Finished returns the stored result.
    pub fn settle(&mut self) -> EngineResult<SettlementResult> {
        self.ensure_live()?;
        match self.phase {
            GamePhase::Finished => self
                .settlement
                .clone()
                .ok_or_else(|| EngineError::transition(self.phase, "settle")),
            GamePhase::Settlement => {
                let input = SettlementInput::from_state(self)?;
                let result = SettlementEngine::new(self.score_config.clone()).settle(&input);
                for player in &mut self.players {
                    player.score = result.score_of(&player.user_id);
                }
                self.settlement = Some(result.clone());
                self.phase = GamePhase::Finished;
                self.turn_seq += 1;
                self.emit(GameEvent::Settled);
                info!(
                    room_id = %self.room_id,
                    game_id = %self.game_id,
                    scores = ?result.final_scores,
                    "Game settled"
                );
                Ok(result)
            }
            phase => Err(EngineError::transition(phase, "settle")),
        }
    }

    // === Invariants ===

    /// Check every state invariant. Returns a description of the first one
    /// that fails.
    pub fn check_invariants(&self) -> Result<(), String> {
        let n = self.player_count();

        let held: usize = self.players.iter().map(PlayerState::tiles_held).sum();
        let accounted = held + self.discard_pile.len() + self.wall.remaining();
        if accounted != self.wall.total() {
            return Err(format!(
                "tile count mismatch: {} held + {} discarded + {} in wall != {}",
                held,
                self.discard_pile.len(),
                self.wall.remaining(),
                self.wall.total()
            ));
        }

        let dealers: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_dealer)
            .map(|(i, _)| i)
            .collect();
        if dealers != [self.dealer_seat_index] {
            return Err(format!(
                "dealer flags {:?} do not match dealer seat {}",
                dealers, self.dealer_seat_index
            ));
        }

        if self.current_player_index >= n || self.dealer_seat_index >= n {
            return Err(format!(
                "seat index out of range: current {}, dealer {}, players {}",
                self.current_player_index, self.dealer_seat_index, n
            ));
        }

        if let (Some(start), Some(deadline)) = (self.turn_start_time, self.turn_deadline) {
            if deadline <= start {
                return Err(format!("deadline {deadline} is not after turn start {start}"));
            }
        }

        if self.phase == GamePhase::Playing {
            let mover = match self.stage {
                TurnStage::Discard => Some(self.current_player_index),
                TurnStage::Claim(_) => None,
            };
            for (i, player) in self.players.iter().enumerate() {
                let expected = if Some(i) == mover {
                    DEALER_HAND_SIZE
                } else {
                    HAND_SIZE
                };
                if player.effective_hand_size() != expected {
                    return Err(format!(
                        "seat {} holds {} tiles, expected {}",
                        i,
                        player.effective_hand_size(),
                        expected
                    ));
                }
            }
        }

        Ok(())
    }
}
