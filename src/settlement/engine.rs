//! Settlement computation.
//!
//! [`SettlementEngine::settle`] is a pure function of a [`SettlementInput`]:
//! it reads the terminal state's seats, win results and gang records and
//! produces per-player scores. Running it twice on the same input gives the
//! same result, which is what lets a replayed game be audited against the
//! original.
//!
//! ## Transfers
//!
//! Settlement is a ledger of transfers. Each one moves a scaled amount from
//! a payer to a receiver, and both sides see the same rounded figure, so the
//! uncapped scores always sum to zero.
//!
//! - Win: each payer gives `base_score` to each winner it pays. Payers are
//!   all non-winners on a self-draw, or the discarder.
//! - An gang: `an_gang_score` from every opponent.
//! - Bu gang: `bu_gang_score` from every opponent.
//! - Ming gang: `ming_gang_score` from the discarder.
//!
//! A transfer touching a winner is scaled by that winner's fan, the
//! self-draw bonus when the win was self-drawn, and the dealer multiplier
//! when either side is the dealer. When both sides won, the receiver's
//! factors apply. Transfers between non-winners are not scaled. For a
//! winner paid at a uniform rate this is [`PlayerResult::compute`] applied
//! to its `base + gang` net.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use super::result::{GameEndReason, GangRecord, PlayerResult, SettlementResult};
use crate::core::{EngineError, EngineResult, ScoreConfig, Seat, SeatMap};
use crate::game::{GamePhase, GameState};
use crate::player::GangKind;
use crate::rules::{HandType, WinResult};

/// A seated player as settlement sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSeat {
    pub user_id: String,
    pub seat: Seat,
    pub is_dealer: bool,
}

/// Everything settlement reads from a finished game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementInput {
    pub players: Vec<SettlementSeat>,
    pub win_results: Vec<WinResult>,
    pub gang_records: Vec<GangRecord>,
    pub end_reason: GameEndReason,
}

impl SettlementInput {
    /// Capture the input from a game in Settlement or Finished.
    pub fn from_state(state: &GameState) -> EngineResult<Self> {
        let end_reason = match (state.phase(), state.end_reason()) {
            (GamePhase::Settlement | GamePhase::Finished, Some(reason)) => reason,
            (phase, _) => return Err(EngineError::transition(phase, "settle")),
        };
        Ok(Self {
            players: state
                .players()
                .iter()
                .map(|p| SettlementSeat {
                    user_id: p.user_id.clone(),
                    seat: p.seat,
                    is_dealer: p.is_dealer,
                })
                .collect(),
            win_results: state.win_results().to_vec(),
            gang_records: state.gang_records().to_vec(),
            end_reason,
        })
    }

    fn seat_of(&self, user_id: &str) -> Option<Seat> {
        self.players
            .iter()
            .find(|p| p.user_id == user_id)
            .map(|p| p.seat)
    }
}

/// Computes settlements under one score configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettlementEngine {
    config: ScoreConfig,
}

impl SettlementEngine {
    #[must_use]
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    #[must_use]
    pub fn settle(&self, input: &SettlementInput) -> SettlementResult {
        let n = input.players.len();
        let cfg = &self.config;

        let mut base = SeatMap::with_value(n, 0i64);
        let mut gang = SeatMap::with_value(n, 0i64);
        let mut net = SeatMap::with_value(n, 0i64);
        let mut fan = SeatMap::with_value(n, 1.0f64);
        let mut won = SeatMap::with_value(n, false);
        let mut in_win = SeatMap::with_value(n, false);
        let mut self_drawn = SeatMap::with_value(n, false);
        let mut hand_types: SeatMap<Vec<HandType>> = SeatMap::with_default(n);
        let mut dealer = SeatMap::with_value(n, false);
        for p in &input.players {
            dealer[p.seat] = p.is_dealer;
        }

        let valid: Vec<&WinResult> = input.win_results.iter().filter(|w| w.is_valid).collect();
        let winner_seats: SmallVec<[Seat; 3]> = valid
            .iter()
            .filter_map(|w| input.seat_of(&w.user_id))
            .collect();

        let mut wins: SmallVec<[(Seat, SmallVec<[Seat; 3]>); 3]> = SmallVec::new();
        for win in &valid {
            let Some(winner) = input.seat_of(&win.user_id) else {
                continue;
            };
            let payers: SmallVec<[Seat; 3]> = if win.is_self_draw {
                Seat::all(n).filter(|s| !winner_seats.contains(s)).collect()
            } else {
                win.winning_from
                    .as_deref()
                    .and_then(|from| input.seat_of(from))
                    .into_iter()
                    .collect()
            };

            fan[winner] = f64::from(win.base_fan.max(1));
            hand_types[winner] = win.hand_types.clone();
            won[winner] = true;
            in_win[winner] = true;
            self_drawn[winner] |= win.is_self_draw;
            for &payer in &payers {
                in_win[payer] = true;
                self_drawn[payer] |= win.is_self_draw;
            }
            wins.push((winner, payers));
        }

        // Scale factor for a transfer between a winner and a counterparty.
        let factor = |winner: Seat, other: Seat| {
            let dealer_multiplier = if dealer[winner] || dealer[other] {
                cfg.dealer_multiplier
            } else {
                1.0
            };
            let self_draw_bonus = if self_drawn[winner] {
                cfg.self_draw_bonus
            } else {
                1.0
            };
            fan[winner] * dealer_multiplier * self_draw_bonus
        };

        for (winner, payers) in &wins {
            for &payer in payers {
                let amount = PlayerResult::scale(cfg.base_score, factor(*winner, payer));
                base[*winner] += cfg.base_score;
                base[payer] -= cfg.base_score;
                net[*winner] += amount;
                net[payer] -= amount;
            }
        }

        for record in &input.gang_records {
            let receiver = record.seat;
            let (payers, amount): (SmallVec<[Seat; 3]>, i64) = match record.kind {
                GangKind::An => (
                    Seat::all(n).filter(|&s| s != receiver).collect(),
                    cfg.an_gang_score,
                ),
                GangKind::Bu => (
                    Seat::all(n).filter(|&s| s != receiver).collect(),
                    cfg.bu_gang_score,
                ),
                GangKind::Ming => (record.from.into_iter().collect(), cfg.ming_gang_score),
            };
            for payer in payers {
                let scaled = if won[receiver] {
                    PlayerResult::scale(amount, factor(receiver, payer))
                } else if won[payer] {
                    PlayerResult::scale(amount, factor(payer, receiver))
                } else {
                    amount
                };
                gang[receiver] += amount;
                gang[payer] -= amount;
                net[receiver] += scaled;
                net[payer] -= scaled;
            }
        }

        let players: Vec<PlayerResult> = input
            .players
            .iter()
            .map(|p| {
                let seat = p.seat;
                let dealer_multiplier = if p.is_dealer && in_win[seat] {
                    cfg.dealer_multiplier
                } else {
                    1.0
                };
                let self_draw_bonus = if self_drawn[seat] {
                    cfg.self_draw_bonus
                } else {
                    1.0
                };
                let final_score = net[seat];
                let cap = cfg.max_score.abs();
                let capped_score = final_score.clamp(-cap, cap);
                PlayerResult {
                    user_id: p.user_id.clone(),
                    seat,
                    base_score: base[seat],
                    fan_multiplier: fan[seat],
                    dealer_multiplier,
                    self_draw_bonus,
                    gang_bonus: gang[seat],
                    final_score,
                    capped_score,
                    hand_types: hand_types[seat].clone(),
                }
            })
            .collect();

        let final_scores = players
            .iter()
            .map(|p| (p.user_id.clone(), p.capped_score))
            .collect();
        let winners: Vec<String> = valid.iter().map(|w| w.user_id.clone()).collect();

        debug!(
            reason = ?input.end_reason,
            winners = winners.len(),
            gangs = input.gang_records.len(),
            "Settlement computed"
        );

        SettlementResult {
            players,
            final_scores,
            is_multiple_winners: winners.len() > 1,
            game_end_reason: input.end_reason,
            winners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{FanKind, FanSource};

    fn seats() -> Vec<SettlementSeat> {
        ["alice", "bob", "carol"]
            .iter()
            .enumerate()
            .map(|(i, name)| SettlementSeat {
                user_id: (*name).to_string(),
                seat: Seat::new(i as u8),
                is_dealer: i == 0,
            })
            .collect()
    }

    fn win(user: &str, self_draw: bool, from: Option<&str>, fan: u32) -> WinResult {
        WinResult {
            user_id: user.to_string(),
            is_valid: true,
            is_self_draw: self_draw,
            winning_tile: Some("5W".parse().unwrap()),
            winning_from: from.map(str::to_string),
            base_fan: fan,
            hand_types: vec![HandType::BasicWin],
            fan_sources: vec![FanSource {
                kind: FanKind::Hand(HandType::BasicWin),
                fan: 1,
            }],
            win_pattern: None,
        }
    }

    fn engine() -> SettlementEngine {
        SettlementEngine::new(
            ScoreConfig::default()
                .with_base_score(4)
                .with_max_score(1000)
                .with_dealer_multiplier(2.0)
                .with_self_draw_bonus(2.0),
        )
    }

    #[test]
    fn test_discard_win() {
        let input = SettlementInput {
            players: seats(),
            win_results: vec![win("bob", false, Some("carol"), 3)],
            gang_records: vec![],
            end_reason: GameEndReason::Win,
        };
        let result = engine().settle(&input);

        // bob: 4 x fan 3
        assert_eq!(result.score_of("bob"), 12);
        assert_eq!(result.score_of("carol"), -12);
        assert_eq!(result.score_of("alice"), 0);
        assert_eq!(result.winners, vec!["bob".to_string()]);
        assert!(!result.is_multiple_winners);
        assert_eq!(result.player("bob").unwrap().hand_types, vec![HandType::BasicWin]);
    }

    #[test]
    fn test_self_draw_with_dealer_payer() {
        let input = SettlementInput {
            players: seats(),
            win_results: vec![win("carol", true, None, 2)],
            gang_records: vec![],
            end_reason: GameEndReason::Win,
        };
        let result = engine().settle(&input);

        // alice is the dealer: 4 x 2 fan x 2 dealer x 2 self-draw
        assert_eq!(result.score_of("alice"), -32);
        // bob: 4 x 2 fan x 2 self-draw
        assert_eq!(result.score_of("bob"), -16);
        assert_eq!(result.score_of("carol"), 48);
        let carol = result.player("carol").unwrap();
        assert_eq!(carol.base_score, 8);
        assert_eq!(carol.fan_multiplier, 2.0);
        assert_eq!(carol.self_draw_bonus, 2.0);
        assert_eq!(result.player("bob").unwrap().fan_multiplier, 1.0);
    }

    #[test]
    fn test_gang_transfers() {
        let input = SettlementInput {
            players: seats(),
            win_results: vec![],
            gang_records: vec![
                GangRecord {
                    user_id: "bob".into(),
                    seat: Seat::new(1),
                    kind: GangKind::An,
                    tile: "1D".parse().unwrap(),
                    from: None,
                },
                GangRecord {
                    user_id: "carol".into(),
                    seat: Seat::new(2),
                    kind: GangKind::Ming,
                    tile: "2D".parse().unwrap(),
                    from: Some(Seat::new(0)),
                },
            ],
            end_reason: GameEndReason::Draw,
        };
        let result = engine().settle(&input);
        let bob = result.player("bob").unwrap();
        assert_eq!(bob.gang_bonus, 4);
        assert_eq!(result.player("alice").unwrap().gang_bonus, -4);
        assert_eq!(result.player("carol").unwrap().gang_bonus, 0);
        assert_eq!(result.score_of("bob"), 4);
        assert_eq!(result.game_end_reason, GameEndReason::Draw);
    }

    #[test]
    fn test_multiple_winners_share_discarder() {
        let input = SettlementInput {
            players: seats(),
            win_results: vec![
                win("bob", false, Some("alice"), 1),
                win("carol", false, Some("alice"), 4),
            ],
            gang_records: vec![],
            end_reason: GameEndReason::Win,
        };
        let result = engine().settle(&input);
        assert!(result.is_multiple_winners);
        // each win is charged at its own fan, doubled for the dealer payer
        assert_eq!(result.score_of("bob"), 8);
        assert_eq!(result.score_of("carol"), 32);
        assert_eq!(result.score_of("alice"), -40);
    }

    fn ming(user: &str, seat: u8, from: u8) -> GangRecord {
        GangRecord {
            user_id: user.into(),
            seat: Seat::new(seat),
            kind: GangKind::Ming,
            tile: "2D".parse().unwrap(),
            from: Some(Seat::new(from)),
        }
    }

    /// A winner's gang income is scaled along with its win.
    #[test]
    fn test_winner_scales_base_and_gang() {
        let input = SettlementInput {
            players: seats(),
            win_results: vec![win("bob", false, Some("carol"), 3)],
            gang_records: vec![ming("bob", 1, 2)],
            end_reason: GameEndReason::Win,
        };
        let result = engine().settle(&input);
        let bob = result.player("bob").unwrap();
        assert_eq!((bob.base_score, bob.gang_bonus), (4, 2));
        assert_eq!(
            bob.final_score,
            PlayerResult::compute(4, 2, 3.0, 1.0, 1.0, 1000).0
        );
        assert_eq!(result.score_of("bob"), 18);
        assert_eq!(result.score_of("carol"), -18);
        assert_eq!(result.score_of("alice"), 0);
    }

    #[test]
    fn test_dealing_in_never_raises_payer_score() {
        let gangs = vec![ming("bob", 1, 0)];
        let without = engine().settle(&SettlementInput {
            players: seats(),
            win_results: vec![],
            gang_records: gangs.clone(),
            end_reason: GameEndReason::Draw,
        });
        let with = engine().settle(&SettlementInput {
            players: seats(),
            win_results: vec![win("carol", false, Some("bob"), 8)],
            gang_records: gangs,
            end_reason: GameEndReason::Win,
        });

        assert_eq!(without.score_of("bob"), 2);
        // bob keeps his unscaled gang income and pays 4 x 8
        assert_eq!(with.score_of("bob"), -30);
        assert!(with.score_of("bob") < without.score_of("bob"));
        assert_eq!(with.score_of("carol"), 32);
        assert_eq!(with.score_of("alice"), -2);
    }

    #[test]
    fn test_scaled_transfers_sum_to_zero() {
        let gangs = vec![
            ming("bob", 1, 0),
            GangRecord {
                user_id: "alice".into(),
                seat: Seat::new(0),
                kind: GangKind::An,
                tile: "7T".parse().unwrap(),
                from: None,
            },
            GangRecord {
                user_id: "carol".into(),
                seat: Seat::new(2),
                kind: GangKind::Bu,
                tile: "3W".parse().unwrap(),
                from: None,
            },
        ];
        let cases = vec![
            vec![win("carol", true, None, 4)],
            vec![win("alice", true, None, 16)],
            vec![win("bob", false, Some("alice"), 1), win("carol", false, Some("alice"), 4)],
            vec![win("alice", false, Some("carol"), 2)],
        ];
        let engine = SettlementEngine::new(
            ScoreConfig::default()
                .with_base_score(3)
                .with_max_score(100_000)
                .with_dealer_multiplier(1.5)
                .with_self_draw_bonus(2.0),
        );
        for wins in cases {
            let result = engine.settle(&SettlementInput {
                players: seats(),
                win_results: wins.clone(),
                gang_records: gangs.clone(),
                end_reason: GameEndReason::Win,
            });
            let total: i64 = result.players.iter().map(|p| p.final_score).sum();
            assert_eq!(total, 0, "unbalanced for {wins:?}");
            assert!(result.players.iter().all(|p| p.final_score == p.capped_score));
        }
    }

    #[test]
    fn test_settle_is_idempotent() {
        let input = SettlementInput {
            players: seats(),
            win_results: vec![win("alice", true, None, 8)],
            gang_records: vec![],
            end_reason: GameEndReason::Win,
        };
        let engine = engine();
        assert_eq!(engine.settle(&input), engine.settle(&input));
    }
}
