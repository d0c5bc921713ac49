//! Game construction.

use std::sync::Arc;

use im::Vector;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

use super::state::{GamePhase, GameState, TurnStage};
use crate::core::{
    EngineError, EngineResult, GameRng, RoomConfig, ScoreConfig, Seat, SharedClock, SystemClock,
    Tile,
};
use crate::player::PlayerState;
use crate::rules::WinEvaluator;
use crate::wall::TileWall;

/// Builder for a [`GameState`] in the Waiting phase.
///
/// ```
/// use mahjong_engine::game::{GameBuilder, GamePhase};
///
/// let mut game = GameBuilder::new("room-1")
///     .players(["alice", "bob", "carol"])
///     .seed(7)
///     .build()
///     .unwrap();
/// assert_eq!(game.phase(), GamePhase::Waiting);
///
/// game.deal_initial_tiles().unwrap();
/// assert_eq!(game.remaining_tiles(), 108 - 14 - 13 - 13);
/// ```
#[derive(Clone, Debug)]
pub struct GameBuilder {
    room_id: String,
    game_id: Option<String>,
    players: Vec<String>,
    room_config: RoomConfig,
    score_config: ScoreConfig,
    seed: u64,
    dealer: Option<Seat>,
    stacked_wall: Option<Vec<Tile>>,
    clock: Option<SharedClock>,
    round_number: u32,
}

impl GameBuilder {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            game_id: None,
            players: Vec::new(),
            room_config: RoomConfig::default(),
            score_config: ScoreConfig::default(),
            seed: 0,
            dealer: None,
            stacked_wall: None,
            clock: None,
            round_number: 1,
        }
    }

    /// Seat the next player.
    pub fn player(mut self, user_id: impl Into<String>) -> Self {
        self.players.push(user_id.into());
        self
    }

    /// Seat players in order.
    pub fn players<I, S>(mut self, user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.players.extend(user_ids.into_iter().map(Into::into));
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    pub fn score_config(mut self, config: ScoreConfig) -> Self {
        self.score_config = config;
        self
    }

    /// Seed for the wall shuffle and dealer choice.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fix the dealer instead of drawing one from the seed.
    pub fn dealer(mut self, seat: Seat) -> Self {
        self.dealer = Some(seat);
        self
    }

    /// Use an unshuffled wall starting with `prefix`.
    pub fn stacked_wall(mut self, prefix: Vec<Tile>) -> Self {
        self.stacked_wall = Some(prefix);
        self
    }

    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    pub fn round(mut self, round_number: u32) -> Self {
        self.round_number = round_number;
        self
    }

    pub fn build(self) -> EngineResult<GameState> {
        self.room_config.validate()?;
        self.score_config.validate()?;

        let n = self.players.len();
        if n != self.room_config.players {
            return Err(EngineError::InvalidConfig(format!(
                "room expects {} players, {} seated",
                self.room_config.players, n
            )));
        }
        let mut seen = FxHashSet::default();
        if let Some(dup) = self.players.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(EngineError::InvalidConfig(format!("player '{dup}' seated twice")));
        }

        let dealer = match self.dealer {
            Some(seat) if seat.index() < n => seat,
            Some(seat) => {
                return Err(EngineError::InvalidConfig(format!(
                    "dealer seat {} out of range for {n} players",
                    seat.index()
                )));
            }
            None => {
                let mut rng = GameRng::new(self.seed).for_context("dealer");
                Seat(rng.index(n) as u8)
            }
        };

        let tile_set = self.room_config.tile_set;
        let wall = match &self.stacked_wall {
            Some(prefix) => TileWall::stacked(tile_set, prefix)?,
            None => TileWall::shuffled(tile_set, self.seed),
        };

        let players: Vec<PlayerState> = self
            .players
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let mut player = PlayerState::new(id.clone(), Seat(i as u8));
                player.is_dealer = i == dealer.index();
                player
            })
            .collect();

        let game_id = self
            .game_id
            .unwrap_or_else(|| format!("{}-{:016x}", self.room_id, self.seed));

        info!(
            room_id = %self.room_id,
            %game_id,
            players = n,
            dealer = dealer.index(),
            seed = self.seed,
            "Game created"
        );

        Ok(GameState {
            room_id: self.room_id,
            game_id,
            phase: GamePhase::Waiting,
            players,
            current_player_index: dealer.index(),
            dealer_seat_index: dealer.index(),
            discard_pile: Vec::new(),
            wall,
            stage: TurnStage::Discard,
            turn_start_time: None,
            turn_deadline: None,
            turn_seq: 0,
            round_number: self.round_number,
            total_turns: 0,
            player_action_counts: FxHashMap::default(),
            random_seed: self.seed,
            stacked_wall: self.stacked_wall,
            gang_records: Vec::new(),
            win_results: Vec::new(),
            end_reason: None,
            game_start_time: None,
            game_end_time: None,
            action_log: Vector::new(),
            events: Vec::new(),
            fault: None,
            settlement: None,
            evaluator: WinEvaluator::new(tile_set),
            room_config: self.room_config,
            score_config: self.score_config,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            after_gang: false,
            gang_discharge: false,
        })
    }
}
