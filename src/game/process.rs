//! Action processing.
//!
//! Every action, whether submitted by a player or played by the engine on a
//! timeout, goes through [`GameState::execute`]. Handlers validate first and
//! mutate second, so a rejected action leaves the state untouched. A failure
//! after validation means the engine itself is broken, and aborts the game.

use std::collections::BTreeSet;

use tracing::{debug, info};

use super::claim::{ClaimResolution, ClaimResponse, ClaimWindow};
use super::event::GameEvent;
use super::state::{ActionOutcome, GamePhase, GameState, TurnStage};
use crate::core::{
    Action, ActionOrigin, ActionRejection, ActionRequest, ActionType, EngineError, EngineResult,
    GameAction, Seat, SeatMap, Tile,
};
use crate::player::{GangKind, MeldSet, MeldType};
use crate::rules::WinContext;
use crate::settlement::{GameEndReason, GangRecord};

impl GameState {
    /// Apply a player's request.
    pub fn apply(&mut self, request: &ActionRequest) -> EngineResult<ActionOutcome> {
        self.execute(&request.actor, &request.action, ActionOrigin::Player)
    }

    pub fn process_discard(&mut self, user_id: &str, tile: Tile) -> EngineResult<ActionOutcome> {
        self.execute(user_id, &Action::Discard { tile }, ActionOrigin::Player)
    }

    /// Claim the open discard from `from_user` as a Peng.
    pub fn process_peng(
        &mut self,
        user_id: &str,
        tile: Tile,
        from_user: &str,
    ) -> EngineResult<ActionOutcome> {
        let action = Action::Peng {
            tile,
            from: from_user.to_string(),
        };
        self.execute(user_id, &action, ActionOrigin::Player)
    }

    /// Declare a gang. `Ming` claims the open discard from `from_user`; `An`
    /// and `Bu` are taken on the player's own turn.
    pub fn process_gang(
        &mut self,
        user_id: &str,
        tile: Tile,
        kind: GangKind,
        from_user: Option<&str>,
    ) -> EngineResult<ActionOutcome> {
        let action = Action::Gang {
            tile,
            kind,
            from: from_user.map(str::to_string),
        };
        self.execute(user_id, &action, ActionOrigin::Player)
    }

    pub fn process_chi(
        &mut self,
        user_id: &str,
        tile: Tile,
        sequence: [Tile; 3],
        from_user: &str,
    ) -> EngineResult<ActionOutcome> {
        let action = Action::Chi {
            tile,
            sequence,
            from: from_user.to_string(),
        };
        self.execute(user_id, &action, ActionOrigin::Player)
    }

    pub fn process_hu(
        &mut self,
        user_id: &str,
        tile: Tile,
        self_draw: bool,
    ) -> EngineResult<ActionOutcome> {
        self.execute(user_id, &Action::Hu { tile, self_draw }, ActionOrigin::Player)
    }

    /// Decline the open discard.
    pub fn process_pass(&mut self, user_id: &str) -> EngineResult<ActionOutcome> {
        self.execute(user_id, &Action::Pass, ActionOrigin::Player)
    }

    pub(super) fn execute(
        &mut self,
        user_id: &str,
        action: &Action,
        origin: ActionOrigin,
    ) -> EngineResult<ActionOutcome> {
        self.ensure_live()?;
        if self.phase != GamePhase::Playing {
            let attempted = format!("{:?}", action.action_type()).to_lowercase();
            return Err(EngineError::transition(self.phase, attempted));
        }
        let seat = self.seat_of(user_id)?;
        let now = self.now();
        let seq_before = self.turn_seq;

        let outcome = match action {
            Action::Discard { tile } => self.handle_discard(seat, *tile, now)?,
            Action::Gang {
                tile,
                kind: kind @ (GangKind::An | GangKind::Bu),
                ..
            } => self.handle_self_gang(seat, *tile, *kind, now)?,
            Action::Hu {
                tile,
                self_draw: true,
            } => self.handle_self_draw_hu(seat, *tile, now)?,
            Action::Peng { .. }
            | Action::Chi { .. }
            | Action::Gang { .. }
            | Action::Hu { .. }
            | Action::Pass => self.handle_claim(seat, action, now)?,
        };

        if self.turn_seq == seq_before {
            self.turn_seq += 1;
        }
        *self
            .player_action_counts
            .entry(user_id.to_string())
            .or_insert(0) += 1;
        let sequence = self.action_log.len() as u64;
        self.action_log.push_back(GameAction {
            sequence,
            timestamp: now,
            user_id: user_id.to_string(),
            action: action.clone(),
            origin,
        });

        if origin == ActionOrigin::Player {
            if self.seat_player_mut(seat).update_last_action_time(now) {
                info!(room_id = %self.room_id, seat = seat.index(), "Player left trustee mode");
                self.emit(GameEvent::TrusteeExited { seat });
            }
            self.sync_statuses();
        }
        self.refresh_available_actions();

        debug!(
            room_id = %self.room_id,
            seat = seat.index(),
            action = ?action.action_type(),
            ?origin,
            turn_seq = self.turn_seq,
            ?outcome,
            "Action accepted"
        );
        self.guard_invariants()?;
        Ok(outcome)
    }

    /// Turn an error from a step that cannot fail after validation into an
    /// abort.
    fn internal<T>(&mut self, result: EngineResult<T>) -> EngineResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) if !err.is_recoverable() => Err(err),
            Err(err) => Err(self.abort(format!("step failed after validation: {err}"))),
        }
    }

    fn expect_turn(&self, seat: Seat, action_type: ActionType) -> EngineResult<()> {
        if matches!(self.stage, TurnStage::Claim(_)) {
            return Err(ActionRejection::WrongStage(action_type).into());
        }
        if seat != self.current_seat() {
            return Err(ActionRejection::NotYourTurn {
                expected: self.current_player_index,
                actual: seat.index(),
            }
            .into());
        }
        Ok(())
    }

    // === Own-turn actions ===

    fn handle_discard(&mut self, seat: Seat, tile: Tile, now: u64) -> EngineResult<ActionOutcome> {
        self.expect_turn(seat, ActionType::Discard)?;
        if self.seat_player(seat).count(tile) == 0 {
            return Err(ActionRejection::TileNotHeld(tile).into());
        }

        let removed = self.seat_player_mut(seat).remove_tile(tile);
        self.internal(removed)?;
        self.seat_player_mut(seat).last_drawn_tile = None;
        self.discard_pile.push(tile);
        self.gang_discharge = self.after_gang;
        self.after_gang = false;
        self.emit(GameEvent::Discarded { seat, tile });

        let options = self.claim_options(seat, tile);
        match ClaimWindow::open(tile, seat, options, self.room_config.multiple_winners) {
            Some(window) => {
                let claimants = window.claimants();
                debug!(
                    room_id = %self.room_id,
                    %tile,
                    discarder = seat.index(),
                    claimants = claimants.len(),
                    "Claim window opened"
                );
                self.stage = TurnStage::Claim(window);
                self.emit(GameEvent::ClaimWindowOpened {
                    tile,
                    discarder: seat,
                    claimants,
                });
                self.start_turn_timer(now);
                Ok(ActionOutcome::ClaimPending)
            }
            None => {
                self.gang_discharge = false;
                let advanced = self.advance_turn(now);
                self.internal(advanced)
            }
        }
    }

    /// Claim types each seat may submit on `tile`.
    fn claim_options(&self, discarder: Seat, tile: Tile) -> SeatMap<BTreeSet<ActionType>> {
        let n = self.player_count();
        let cfg = &self.room_config;
        SeatMap::new(n, |seat| {
            let mut set = BTreeSet::new();
            if seat == discarder {
                return set;
            }
            let player = self.seat_player(seat);
            let mut hand = player.hand().to_vec();
            hand.push(tile);
            if self.evaluator.is_winning(&hand, player.melds()) {
                set.insert(ActionType::Hu);
            }
            if cfg.allow_gang && player.can_gang(tile) {
                set.insert(ActionType::Gang);
            }
            if cfg.allow_peng && player.can_peng(tile) {
                set.insert(ActionType::Peng);
            }
            if cfg.allow_chi && discarder == seat.previous(n) && player.can_chi(tile) {
                set.insert(ActionType::Chi);
            }
            set
        })
    }

    fn handle_self_gang(
        &mut self,
        seat: Seat,
        tile: Tile,
        kind: GangKind,
        now: u64,
    ) -> EngineResult<ActionOutcome> {
        self.expect_turn(seat, ActionType::Gang)?;
        if !self.room_config.allow_gang {
            return Err(ActionRejection::Disallowed(ActionType::Gang).into());
        }
        let player = self.seat_player(seat);
        match kind {
            GangKind::An if !player.can_concealed_gang(tile) => {
                return Err(ActionRejection::InsufficientCopies {
                    tile,
                    action: ActionType::Gang,
                }
                .into());
            }
            GangKind::Bu if !player.can_upgrade_gang(tile) => {
                return Err(ActionRejection::NoPengToUpgrade(tile).into());
            }
            _ => {}
        }

        let player = self.seat_player_mut(seat);
        let formed = match kind {
            GangKind::Bu => player.upgrade_peng(tile),
            _ => player.remove_tiles(tile, 4).map(|()| {
                player.add_meld(MeldSet::gang(tile, GangKind::An, None));
            }),
        };
        self.internal(formed)?;
        self.record_gang(seat, kind, tile, None);

        let drawn = self.draw_for_current(true, now);
        self.internal(drawn)
    }

    fn handle_self_draw_hu(&mut self, seat: Seat, tile: Tile, now: u64) -> EngineResult<ActionOutcome> {
        self.expect_turn(seat, ActionType::Hu)?;
        let player = self.seat_player(seat);
        if player.last_drawn_tile != Some(tile) {
            return Err(ActionRejection::NotDrawnTile(tile).into());
        }
        let ctx = WinContext::self_draw(tile)
            .with_after_gang(self.after_gang)
            .with_last_tile(self.wall.is_empty());
        let result = self
            .evaluator
            .evaluate(&player.user_id, player.hand(), player.melds(), &ctx);
        if !result.is_valid {
            return Err(ActionRejection::NotAWinningHand.into());
        }

        info!(
            room_id = %self.room_id,
            seat = seat.index(),
            %tile,
            base_fan = result.base_fan,
            "Self-drawn win"
        );
        self.emit(GameEvent::Won {
            seat,
            tile,
            self_draw: true,
            base_fan: result.base_fan,
        });
        self.win_results.push(result);
        let ended = self.end_game_at(GameEndReason::Win, now);
        self.internal(ended)?;
        Ok(ActionOutcome::GameEnded(GameEndReason::Win))
    }

    fn record_gang(&mut self, seat: Seat, kind: GangKind, tile: Tile, from: Option<Seat>) {
        let user_id = self.seat_player(seat).user_id.clone();
        debug!(room_id = %self.room_id, seat = seat.index(), ?kind, %tile, "Gang declared");
        self.gang_records.push(GangRecord {
            user_id,
            seat,
            kind,
            tile,
            from,
        });
        self.emit(GameEvent::GangDeclared { seat, kind, tile });
    }

    // === Claims ===

    fn handle_claim(&mut self, seat: Seat, action: &Action, now: u64) -> EngineResult<ActionOutcome> {
        let TurnStage::Claim(window) = &self.stage else {
            return Err(ActionRejection::NothingToClaim.into());
        };
        let open = window.tile();
        let discarder = window.discarder();

        if let Some(claimed) = action.tile() {
            if claimed != open {
                return Err(ActionRejection::NotTopDiscard { claimed, open }.into());
            }
        }
        let declared_from = match action {
            Action::Peng { from, .. } | Action::Chi { from, .. } => Some(from.as_str()),
            Action::Gang { from: Some(from), .. } => Some(from.as_str()),
            Action::Gang { from: None, .. } => {
                return Err(ActionRejection::MissingDiscarder.into());
            }
            _ => None,
        };
        if let Some(claimed) = declared_from {
            let actual = &self.seat_player(discarder).user_id;
            if claimed != actual {
                return Err(ActionRejection::WrongDiscarder {
                    claimed: claimed.to_string(),
                    actual: actual.clone(),
                }
                .into());
            }
        }
        if !window.is_eligible(seat) {
            return Err(ActionRejection::NotEligible(seat.index()).into());
        }
        if window.has_responded(seat) {
            return Err(ActionRejection::AlreadyResponded(seat.index()).into());
        }

        let player = self.seat_player(seat);
        let cfg = &self.room_config;
        let insufficient = |action_type| ActionRejection::InsufficientCopies {
            tile: open,
            action: action_type,
        };
        match action {
            Action::Peng { .. } => {
                if !cfg.allow_peng {
                    return Err(ActionRejection::Disallowed(ActionType::Peng).into());
                }
                if !player.can_peng(open) {
                    return Err(insufficient(ActionType::Peng).into());
                }
            }
            Action::Gang { .. } => {
                if !cfg.allow_gang {
                    return Err(ActionRejection::Disallowed(ActionType::Gang).into());
                }
                if !player.can_gang(open) {
                    return Err(insufficient(ActionType::Gang).into());
                }
            }
            Action::Chi { sequence, .. } => {
                if !cfg.allow_chi {
                    return Err(ActionRejection::Disallowed(ActionType::Chi).into());
                }
                if discarder != seat.previous(self.player_count()) {
                    return Err(ActionRejection::NotUpstream.into());
                }
                let mut run = *sequence;
                run.sort();
                if !player.chi_sequences(open).contains(&run) {
                    return Err(ActionRejection::InvalidChiSequence(sequence.to_vec()).into());
                }
            }
            Action::Hu { .. } => {
                let mut hand = player.hand().to_vec();
                hand.push(open);
                if !self.evaluator.is_winning(&hand, player.melds()) {
                    return Err(ActionRejection::NotAWinningHand.into());
                }
            }
            Action::Pass | Action::Discard { .. } => {}
        }

        let response = match action {
            Action::Pass => ClaimResponse::Pass,
            other => ClaimResponse::Claim(other.clone()),
        };
        if let TurnStage::Claim(window) = &mut self.stage {
            window.respond(seat, response)?;
        }
        self.try_resolve_window(now)
    }

    /// Resolve the open window if its outcome is settled.
    fn try_resolve_window(&mut self, now: u64) -> EngineResult<ActionOutcome> {
        let (resolution, discarder) = match &self.stage {
            TurnStage::Claim(window) if window.is_resolved() => (window.resolve(), window.discarder()),
            TurnStage::Claim(_) => return Ok(ActionOutcome::ClaimPending),
            TurnStage::Discard => return Ok(ActionOutcome::Applied),
        };
        self.stage = TurnStage::Discard;

        match resolution {
            ClaimResolution::NoClaim => {
                self.gang_discharge = false;
                let advanced = self.advance_turn(now);
                self.internal(advanced)
            }
            ClaimResolution::Meld(seat, action) => self.take_meld(seat, discarder, &action, now),
            ClaimResolution::Winners(winners) => {
                let tile = self.pop_open_discard()?;
                let discarder_id = self.seat_player(discarder).user_id.clone();
                for (seat, _) in &winners {
                    let player = self.seat_player(*seat);
                    let mut hand = player.hand().to_vec();
                    hand.push(tile);
                    let ctx = WinContext::discard(tile, discarder_id.clone())
                        .with_gang_discharge(self.gang_discharge);
                    let result = self
                        .evaluator
                        .evaluate(&player.user_id, &hand, player.melds(), &ctx);
                    if !result.is_valid {
                        return Err(self.abort(format!(
                            "accepted hu by seat {} does not evaluate as a win",
                            seat.index()
                        )));
                    }
                    info!(
                        room_id = %self.room_id,
                        seat = seat.index(),
                        %tile,
                        discarder = discarder.index(),
                        base_fan = result.base_fan,
                        "Win on discard"
                    );
                    self.emit(GameEvent::Won {
                        seat: *seat,
                        tile,
                        self_draw: false,
                        base_fan: result.base_fan,
                    });
                    self.win_results.push(result);
                }
                if let Some((closest, _)) = winners.first() {
                    self.seat_player_mut(*closest).add_tile(tile);
                }
                self.gang_discharge = false;
                let ended = self.end_game_at(GameEndReason::Win, now);
                self.internal(ended)?;
                Ok(ActionOutcome::GameEnded(GameEndReason::Win))
            }
        }
    }

    fn pop_open_discard(&mut self) -> EngineResult<Tile> {
        match self.discard_pile.pop() {
            Some(tile) => Ok(tile),
            None => Err(self.abort("claim resolved with an empty discard pile".to_string())),
        }
    }

    /// Move the discard into the claimer's meld and give them the turn.
    fn take_meld(
        &mut self,
        seat: Seat,
        discarder: Seat,
        action: &Action,
        now: u64,
    ) -> EngineResult<ActionOutcome> {
        let tile = self.pop_open_discard()?;
        self.gang_discharge = false;
        self.after_gang = false;

        let player = self.seat_player_mut(seat);
        let (formed, meld_type) = match action {
            Action::Chi { sequence, .. } => {
                let others: Vec<Tile> = sequence.iter().copied().filter(|&t| t != tile).collect();
                let removed = others
                    .iter()
                    .try_for_each(|&t| player.remove_tile(t))
                    .map(|()| player.add_meld(MeldSet::chi(*sequence, discarder)));
                (removed, MeldType::Chi)
            }
            Action::Gang { .. } => {
                let removed = player
                    .remove_tiles(tile, 3)
                    .map(|()| player.add_meld(MeldSet::gang(tile, GangKind::Ming, Some(discarder))));
                (removed, MeldType::Gang(GangKind::Ming))
            }
            _ => {
                let removed = player
                    .remove_tiles(tile, 2)
                    .map(|()| player.add_meld(MeldSet::peng(tile, discarder)));
                (removed, MeldType::Peng)
            }
        };
        self.internal(formed)?;
        self.seat_player_mut(seat).last_drawn_tile = None;

        self.current_player_index = seat.index();
        self.total_turns += 1;
        self.sync_statuses();
        debug!(
            room_id = %self.room_id,
            seat = seat.index(),
            ?meld_type,
            %tile,
            from = discarder.index(),
            "Discard claimed"
        );
        self.emit(GameEvent::Claimed {
            seat,
            meld_type,
            tile,
            from: discarder,
        });

        if meld_type == MeldType::Gang(GangKind::Ming) {
            self.record_gang(seat, GangKind::Ming, tile, Some(discarder));
            let drawn = self.draw_for_current(true, now);
            return self.internal(drawn);
        }
        self.start_turn_timer(now);
        Ok(ActionOutcome::Applied)
    }
}
