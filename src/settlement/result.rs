//! Settlement output types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{Seat, Tile};
use crate::player::GangKind;
use crate::rules::HandType;

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameEndReason {
    /// At least one Hu was accepted.
    Win,
    /// The wall ran out.
    Draw,
    /// The game exceeded its maximum duration.
    Timeout,
}

/// A gang declared during the game, kept for settlement transfers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GangRecord {
    pub user_id: String,
    pub seat: Seat,
    pub kind: GangKind,
    pub tile: Tile,
    /// Discarder for a Ming gang.
    pub from: Option<Seat>,
}

/// One player's settlement line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerResult {
    pub user_id: String,
    pub seat: Seat,
    /// Net of win transfers, before multipliers.
    pub base_score: i64,
    /// The player's own winning fan, 1 for everyone else.
    pub fan_multiplier: f64,
    pub dealer_multiplier: f64,
    pub self_draw_bonus: f64,
    /// Net of gang transfers, before multipliers.
    pub gang_bonus: i64,
    /// Net of every transfer after scaling.
    pub final_score: i64,
    pub capped_score: i64,
    pub hand_types: Vec<HandType>,
}

impl PlayerResult {
    /// Scale one amount by a combined multiplier, rounding half away from zero.
    #[must_use]
    pub fn scale(amount: i64, factor: f64) -> i64 {
        (amount as f64 * factor).round() as i64
    }

    /// Apply the settlement formula. Returns `(final_score, capped_score)`.
    ///
    /// `final = round((base + gang) × fan × dealer × self_draw)`, then
    /// clamped to `±max_score`.
    ///
    /// ```
    /// use mahjong_engine::settlement::PlayerResult;
    ///
    /// assert_eq!(PlayerResult::compute(4, 2, 3.0, 1.0, 1.0, 64), (18, 18));
    /// assert_eq!(PlayerResult::compute(-4, 0, 8.0, 2.0, 1.0, 32), (-64, -32));
    /// ```
    #[must_use]
    pub fn compute(
        base_score: i64,
        gang_bonus: i64,
        fan_multiplier: f64,
        dealer_multiplier: f64,
        self_draw_bonus: f64,
        max_score: i64,
    ) -> (i64, i64) {
        let final_score = Self::scale(
            base_score + gang_bonus,
            fan_multiplier * dealer_multiplier * self_draw_bonus,
        );
        let cap = max_score.abs();
        (final_score, final_score.clamp(-cap, cap))
    }
}

/// Aggregate settlement of one game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettlementResult {
    /// Seat order.
    pub players: Vec<PlayerResult>,
    /// User id to capped score.
    pub final_scores: BTreeMap<String, i64>,
    pub is_multiple_winners: bool,
    pub game_end_reason: GameEndReason,
    /// Winners, closest to the discarder first.
    pub winners: Vec<String>,
}

impl SettlementResult {
    #[must_use]
    pub fn player(&self, user_id: &str) -> Option<&PlayerResult> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    /// Capped score for `user_id`, 0 if unknown.
    #[must_use]
    pub fn score_of(&self, user_id: &str) -> i64 {
        self.final_scores.get(user_id).copied().unwrap_or(0)
    }
}
