//! Room and scoring configuration.
//!
//! Rooms are configured at startup by providing:
//! - `RoomConfig`: table size, tile set, which claims are enabled, timers
//! - `ScoreConfig`: base stakes, cap and multipliers for settlement
//!
//! Both derive serde so an external loader can read them, and both expose
//! `validate()` so an unplayable configuration is rejected before a game
//! starts rather than failing mid-deal.

use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};
use super::tile::TileSet;

/// Tiles held by the dealer after the deal.
pub const DEALER_HAND_SIZE: usize = 14;

/// Tiles held by every other player after the deal.
pub const HAND_SIZE: usize = 13;

/// Per-room rule and timer configuration.
///
/// ```
/// use mahjong_engine::core::{RoomConfig, TileSet};
///
/// let config = RoomConfig::default()
///     .with_chi(true)
///     .with_turn_time_limit_ms(15_000);
/// assert_eq!(config.players, 3);
/// assert_eq!(config.tile_set, TileSet::AllSuits);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Number of seats.
    pub players: usize,

    pub tile_set: TileSet,

    pub allow_peng: bool,
    pub allow_gang: bool,
    pub allow_chi: bool,

    /// Time a player has to act, in milliseconds.
    pub turn_time_limit_ms: u64,

    /// Consecutive timeouts before a player is put in trustee mode.
    pub trustee_timeout_threshold: u32,

    /// Deadline used while the acting player is in trustee mode.
    pub trustee_delay_ms: u64,

    /// Accept every Hu claim on a discard instead of only the closest one.
    pub multiple_winners: bool,

    /// Hard cap on game length. `None` for unlimited.
    pub max_game_duration_ms: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            players: 3,
            tile_set: TileSet::AllSuits,
            allow_peng: true,
            allow_gang: true,
            allow_chi: false,
            turn_time_limit_ms: 30_000,
            trustee_timeout_threshold: 3,
            trustee_delay_ms: 1_000,
            multiple_winners: true,
            max_game_duration_ms: None,
        }
    }
}

impl RoomConfig {
    #[must_use]
    pub fn with_players(mut self, players: usize) -> Self {
        self.players = players;
        self
    }

    #[must_use]
    pub fn with_tile_set(mut self, tile_set: TileSet) -> Self {
        self.tile_set = tile_set;
        self
    }

    #[must_use]
    pub fn with_peng(mut self, allow: bool) -> Self {
        self.allow_peng = allow;
        self
    }

    #[must_use]
    pub fn with_gang(mut self, allow: bool) -> Self {
        self.allow_gang = allow;
        self
    }

    #[must_use]
    pub fn with_chi(mut self, allow: bool) -> Self {
        self.allow_chi = allow;
        self
    }

    #[must_use]
    pub fn with_turn_time_limit_ms(mut self, ms: u64) -> Self {
        self.turn_time_limit_ms = ms;
        self
    }

    #[must_use]
    pub fn with_trustee_timeout_threshold(mut self, threshold: u32) -> Self {
        self.trustee_timeout_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_trustee_delay_ms(mut self, ms: u64) -> Self {
        self.trustee_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn with_multiple_winners(mut self, allow: bool) -> Self {
        self.multiple_winners = allow;
        self
    }

    #[must_use]
    pub fn with_max_game_duration_ms(mut self, ms: u64) -> Self {
        self.max_game_duration_ms = Some(ms);
        self
    }

    /// Tiles removed from the wall by the initial deal.
    #[must_use]
    pub fn dealt_tiles(&self) -> usize {
        DEALER_HAND_SIZE + HAND_SIZE * self.players.saturating_sub(1)
    }

    /// Reject configurations that cannot be played.
    pub fn validate(&self) -> EngineResult<()> {
        if !(2..=4).contains(&self.players) {
            return Err(EngineError::InvalidConfig(format!(
                "players must be between 2 and 4, got {}",
                self.players
            )));
        }
        let deck = self.tile_set.deck_size();
        if self.dealt_tiles() >= deck {
            return Err(EngineError::InvalidConfig(format!(
                "{:?} holds {} tiles, not enough to deal {} players",
                self.tile_set, deck, self.players
            )));
        }
        if self.turn_time_limit_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "turn_time_limit_ms must be positive".into(),
            ));
        }
        if self.trustee_delay_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "trustee_delay_ms must be positive".into(),
            ));
        }
        if self.trustee_timeout_threshold == 0 {
            return Err(EngineError::InvalidConfig(
                "trustee_timeout_threshold must be at least 1".into(),
            ));
        }
        if self.max_game_duration_ms == Some(0) {
            return Err(EngineError::InvalidConfig(
                "max_game_duration_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Settlement stakes and multipliers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Points moved per winner per payer, before multipliers.
    pub base_score: i64,

    /// Absolute cap on a player's final score.
    pub max_score: i64,

    pub dealer_multiplier: f64,
    pub self_draw_bonus: f64,

    /// Collected from the discarder for a claimed gang.
    pub ming_gang_score: i64,
    /// Collected from every opponent for a concealed gang.
    pub an_gang_score: i64,
    /// Collected from every opponent for an upgraded gang.
    pub bu_gang_score: i64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            base_score: 1,
            max_score: 64,
            dealer_multiplier: 2.0,
            self_draw_bonus: 2.0,
            ming_gang_score: 2,
            an_gang_score: 2,
            bu_gang_score: 1,
        }
    }
}

impl ScoreConfig {
    #[must_use]
    pub fn with_base_score(mut self, score: i64) -> Self {
        self.base_score = score;
        self
    }

    #[must_use]
    pub fn with_max_score(mut self, score: i64) -> Self {
        self.max_score = score;
        self
    }

    #[must_use]
    pub fn with_dealer_multiplier(mut self, multiplier: f64) -> Self {
        self.dealer_multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_self_draw_bonus(mut self, multiplier: f64) -> Self {
        self.self_draw_bonus = multiplier;
        self
    }

    /// Set the Ming, An and Bu gang transfers.
    #[must_use]
    pub fn with_gang_scores(mut self, ming: i64, an: i64, bu: i64) -> Self {
        self.ming_gang_score = ming;
        self.an_gang_score = an;
        self.bu_gang_score = bu;
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.base_score <= 0 {
            return Err(EngineError::InvalidConfig(
                "base_score must be positive".into(),
            ));
        }
        if self.max_score < self.base_score {
            return Err(EngineError::InvalidConfig(format!(
                "max_score {} is below base_score {}",
                self.max_score, self.base_score
            )));
        }
        for (name, value) in [
            ("dealer_multiplier", self.dealer_multiplier),
            ("self_draw_bonus", self.self_draw_bonus),
        ] {
            if !value.is_finite() || value < 1.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be a finite value of at least 1.0"
                )));
            }
        }
        if self.ming_gang_score < 0 || self.an_gang_score < 0 || self.bu_gang_score < 0 {
            return Err(EngineError::InvalidConfig(
                "gang scores cannot be negative".into(),
            ));
        }
        Ok(())
    }
}
