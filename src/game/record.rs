//! Game records and replay.
//!
//! A [`GameRecord`] holds everything needed to reproduce a game: the setup
//! (players, configs, seed, dealer, stacked wall) and the accepted action log
//! with timestamps and origins. [`GameRecord::replay`] feeds the log back
//! through the same engine under a manual clock and returns the rebuilt
//! state, which must match the original.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::builder::GameBuilder;
use super::state::{GamePhase, GameState};
use crate::core::{
    EngineError, EngineResult, GameAction, ManualClock, RoomConfig, ScoreConfig, Seat, Tile,
};
use crate::settlement::GameEndReason;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub room_id: String,
    pub game_id: String,
    /// User ids in seat order.
    pub players: Vec<String>,
    pub dealer_seat: Seat,
    pub room_config: RoomConfig,
    pub score_config: ScoreConfig,
    pub seed: u64,
    pub stacked_wall: Option<Vec<Tile>>,
    pub round_number: u32,
    /// Clock time of the deal, if the game started.
    pub started_at: Option<u64>,
    pub actions: Vec<GameAction>,
    /// End reason and clock time, if the game ended.
    pub ended: Option<(GameEndReason, u64)>,
    pub settled: bool,
}

impl GameState {
    /// Capture this game as a replayable record.
    #[must_use]
    pub fn record(&self) -> GameRecord {
        GameRecord {
            room_id: self.room_id.clone(),
            game_id: self.game_id.clone(),
            players: self.players.iter().map(|p| p.user_id.clone()).collect(),
            dealer_seat: Seat(self.dealer_seat_index as u8),
            room_config: self.room_config.clone(),
            score_config: self.score_config.clone(),
            seed: self.random_seed,
            stacked_wall: self.stacked_wall.clone(),
            round_number: self.round_number,
            started_at: self.game_start_time,
            actions: self.action_log.iter().cloned().collect(),
            ended: self.end_reason.zip(self.game_end_time),
            settled: self.phase == GamePhase::Finished,
        }
    }
}

impl GameRecord {
    /// Rebuild the game by replaying every recorded action.
    ///
    /// Fails with the first error the engine raises, which means the record
    /// does not describe a game this engine would have accepted.
    pub fn replay(&self) -> EngineResult<GameState> {
        let clock = ManualClock::new(self.started_at.unwrap_or(0));
        let mut builder = GameBuilder::new(self.room_id.clone())
            .game_id(self.game_id.clone())
            .players(self.players.iter().cloned())
            .room_config(self.room_config.clone())
            .score_config(self.score_config.clone())
            .seed(self.seed)
            .dealer(self.dealer_seat)
            .round(self.round_number)
            .clock(Arc::new(clock.clone()));
        if let Some(prefix) = &self.stacked_wall {
            builder = builder.stacked_wall(prefix.clone());
        }
        let mut game = builder.build()?;

        if self.started_at.is_none() {
            return Ok(game);
        }
        game.deal_initial_tiles()?;

        for action in &self.actions {
            clock.set(action.timestamp);
            let seat = game.seat_of(&action.user_id)?;
            game.play_for(seat, &action.action, action.origin)?;
        }

        if let Some((reason, at)) = self.ended {
            if game.phase() == GamePhase::Playing {
                clock.set(at);
                game.end_game(reason)?;
            }
        }
        if self.settled {
            game.settle()?;
        }

        debug!(
            room_id = %self.room_id,
            game_id = %self.game_id,
            actions = self.actions.len(),
            "Game replayed"
        );
        Ok(game)
    }

    pub fn to_bytes(&self) -> EngineResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> EngineResult<Self> {
        bincode::deserialize(bytes).map_err(EngineError::from)
    }
}
