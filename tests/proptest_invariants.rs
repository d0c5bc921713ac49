//! Property-based invariant tests for the turn engine.
//!
//! Uses proptest to generate seeds, plays whole games with random legal
//! actions and timeouts, and checks the state invariants after every step.

use proptest::prelude::*;

mod common;

use common::{play_random, seeded_game, PLAYERS};
use mahjong_engine::core::{Clock, ManualClock, RoomConfig, TileSet};
use mahjong_engine::game::{GamePhase, GameState};

fn assert_step_invariants(game: &GameState) {
    if let Err(reason) = game.check_invariants() {
        panic!("invariant broken: {reason}");
    }
    assert!(!game.is_faulted(), "game aborted: {:?}", game.fault_reason());
    if game.phase() == GamePhase::Playing {
        let deadline = game.turn_deadline().expect("deadline while playing");
        assert!(deadline > game.turn_start_time().unwrap_or(0));
    }
}

fn play_and_settle(mut game: GameState, clock: &ManualClock, seed: u64, tick_every: usize) {
    let steps = play_random(&mut game, clock, seed, tick_every, assert_step_invariants);
    assert!(steps < common::MAX_STEPS, "game did not finish");
    assert_ne!(game.phase(), GamePhase::Playing);

    let result = game.settle().unwrap();
    assert_eq!(game.phase(), GamePhase::Finished);
    // Every transfer is debited exactly as credited.
    let total: i64 = result.players.iter().map(|p| p.final_score).sum();
    assert_eq!(total, 0);
    if result.players.iter().all(|p| p.final_score == p.capped_score) {
        assert_eq!(result.final_scores.values().sum::<i64>(), 0);
    }
    for player in game.players() {
        assert_eq!(player.score, result.score_of(&player.user_id));
    }
    assert!(game.game_end_time().unwrap() <= game.clock().now_millis());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_play_keeps_invariants(seed in any::<u64>(), tick_every in 0usize..9) {
        let (game, clock) = seeded_game(seed, RoomConfig::default(), &PLAYERS);
        play_and_settle(game, &clock, seed, tick_every);
    }

    #[test]
    fn random_play_with_chi(seed in any::<u64>()) {
        let config = RoomConfig::default().with_chi(true).with_multiple_winners(false);
        let (game, clock) = seeded_game(seed, config, &PLAYERS);
        play_and_settle(game, &clock, seed, 6);
    }

    #[test]
    fn two_player_wan_only(seed in any::<u64>(), tick_every in 0usize..5) {
        let config = RoomConfig::default()
            .with_players(2)
            .with_tile_set(TileSet::WanOnly);
        let (game, clock) = seeded_game(seed, config, &PLAYERS[..2]);
        prop_assert_eq!(game.remaining_tiles(), 36 - 27);
        play_and_settle(game, &clock, seed, tick_every);
    }

    #[test]
    fn dealer_is_stable_for_seed(seed in any::<u64>()) {
        let (a, _) = seeded_game(seed, RoomConfig::default(), &PLAYERS);
        let (b, _) = seeded_game(seed, RoomConfig::default(), &PLAYERS);
        prop_assert_eq!(a.dealer_seat_index(), b.dealer_seat_index());
        prop_assert_eq!(a.players(), b.players());
        prop_assert!(a.players()[a.dealer_seat_index()].is_dealer);
        prop_assert_eq!(a.players()[a.dealer_seat_index()].hand_len(), 14);
    }
}
