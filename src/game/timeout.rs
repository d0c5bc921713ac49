//! Turn deadlines and auto-play.
//!
//! A timer is identified by the `turn_seq` it was armed with. Any accepted
//! transition bumps `turn_seq`, so a timer that fires after the player has
//! already acted is recognized as stale and ignored.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::event::GameEvent;
use super::state::{ActionOutcome, GamePhase, GameState, TurnStage};
use crate::core::{Action, ActionOrigin, EngineResult, Seat};
use crate::settlement::GameEndReason;

/// What a timeout tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutOutcome {
    /// The timer no longer matches the game.
    Stale,
    /// The deadline has not passed yet.
    NotDue,
    /// The engine played for the awaited players.
    AutoPlayed { actions: usize, outcome: ActionOutcome },
    /// The game ran past its maximum duration and ended.
    Expired,
}

impl GameState {
    /// Whether the current turn's deadline has passed.
    #[must_use]
    pub fn is_turn_timed_out(&self) -> bool {
        self.phase == GamePhase::Playing && self.turn_deadline.is_some_and(|d| self.now() >= d)
    }

    /// When the game exceeds its maximum duration, if one is configured.
    #[must_use]
    pub fn game_expiry(&self) -> Option<u64> {
        let start = self.game_start_time?;
        self.room_config.max_game_duration_ms.map(|max| start + max)
    }

    /// The next time [`handle_timeout`](Self::handle_timeout) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        if self.phase != GamePhase::Playing || self.fault.is_some() {
            return None;
        }
        match (self.turn_deadline, self.game_expiry()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Handle a timeout for the current turn sequence.
    pub fn tick(&mut self) -> EngineResult<TimeoutOutcome> {
        self.handle_timeout(self.turn_seq)
    }

    /// Handle a timer armed at `turn_seq`.
    pub fn handle_timeout(&mut self, turn_seq: u64) -> EngineResult<TimeoutOutcome> {
        self.ensure_live()?;
        if self.phase != GamePhase::Playing || turn_seq != self.turn_seq {
            warn!(
                room_id = %self.room_id,
                turn_seq,
                current_seq = self.turn_seq,
                phase = ?self.phase,
                "Ignoring stale timeout"
            );
            return Ok(TimeoutOutcome::Stale);
        }

        let now = self.now();
        if self.game_expiry().is_some_and(|expiry| now >= expiry) {
            info!(room_id = %self.room_id, game_id = %self.game_id, "Game exceeded its maximum duration");
            self.end_game(GameEndReason::Timeout)?;
            return Ok(TimeoutOutcome::Expired);
        }
        if !self.is_turn_timed_out() {
            return Ok(TimeoutOutcome::NotDue);
        }

        match &self.stage {
            TurnStage::Discard => {
                let seat = self.current_seat();
                let action = self.auto_action(seat)?;
                let origin = self.auto_origin(seat);
                let outcome = self.play_for(seat, &action, origin)?;
                Ok(TimeoutOutcome::AutoPlayed { actions: 1, outcome })
            }
            TurnStage::Claim(window) => {
                let pending = window.pending_seats();
                let mut outcome = ActionOutcome::ClaimPending;
                let mut actions = 0;
                for seat in pending {
                    if !matches!(self.stage, TurnStage::Claim(_)) {
                        break;
                    }
                    let origin = self.auto_origin(seat);
                    outcome = self.play_for(seat, &Action::Pass, origin)?;
                    actions += 1;
                }
                Ok(TimeoutOutcome::AutoPlayed { actions, outcome })
            }
        }
    }

    fn auto_origin(&self, seat: Seat) -> ActionOrigin {
        if self.seat_player(seat).is_trustee() {
            ActionOrigin::Trustee
        } else {
            ActionOrigin::Timeout
        }
    }

    /// Self-drawn Hu if the hand wins, else discard the drawn tile, else the
    /// highest tile.
    fn auto_action(&mut self, seat: Seat) -> EngineResult<Action> {
        let player = self.seat_player(seat);
        if let Some(tile) = player.last_drawn_tile {
            if self.evaluator.is_winning(player.hand(), player.melds()) {
                return Ok(Action::Hu {
                    tile,
                    self_draw: true,
                });
            }
        }
        match player.last_drawn_tile.or_else(|| player.highest_tile()) {
            Some(tile) => Ok(Action::Discard { tile }),
            None => Err(self.abort(format!("seat {} has no tile to discard", seat.index()))),
        }
    }

    /// Play `action` for `seat` on the engine's behalf.
    pub(super) fn play_for(
        &mut self,
        seat: Seat,
        action: &Action,
        origin: ActionOrigin,
    ) -> EngineResult<ActionOutcome> {
        if origin == ActionOrigin::Timeout {
            let threshold = self.room_config.trustee_timeout_threshold;
            if self.seat_player_mut(seat).increment_timeouts(threshold) {
                warn!(
                    room_id = %self.room_id,
                    seat = seat.index(),
                    threshold,
                    "Player entered trustee mode"
                );
                self.emit(GameEvent::TrusteeEntered { seat });
            }
        }
        let user_id = self.seat_player(seat).user_id.clone();
        match self.execute(&user_id, action, origin) {
            Ok(outcome) => Ok(outcome),
            Err(err) if err.is_recoverable() => Err(self.abort(format!(
                "auto-played {:?} for seat {} was rejected: {err}",
                action.action_type(),
                seat.index()
            ))),
            Err(err) => Err(err),
        }
    }
}
