//! Record and replay tests.
//!
//! A game rebuilt from its record must reach exactly the same state: same
//! hands, same log, same settlement.

mod common;

use common::{play_random, seeded_game, stacked_game, tile, PLAYERS};
use mahjong_engine::core::{Action, RoomConfig};
use mahjong_engine::game::{GameBuilder, GamePhase, GameRecord, GameState};
use mahjong_engine::player::GangKind;
use mahjong_engine::settlement::GameEndReason;

fn assert_same_game(replayed: &GameState, original: &GameState) {
    assert_eq!(replayed.phase(), original.phase());
    assert_eq!(replayed.players(), original.players());
    assert_eq!(replayed.action_log(), original.action_log());
    assert_eq!(replayed.discard_pile(), original.discard_pile());
    assert_eq!(replayed.remaining_tiles(), original.remaining_tiles());
    assert_eq!(replayed.win_results(), original.win_results());
    assert_eq!(replayed.gang_records(), original.gang_records());
    assert_eq!(replayed.end_reason(), original.end_reason());
    assert_eq!(replayed.game_end_time(), original.game_end_time());
    assert_eq!(replayed.turn_seq(), original.turn_seq());
    assert_eq!(replayed.total_turns(), original.total_turns());
    assert_eq!(replayed.settlement(), original.settlement());
    assert_eq!(replayed.record(), original.record());
}

/// Random games, with every fifth step a timeout, replay exactly.
#[test]
fn test_random_games_replay() {
    for seed in 0..8u64 {
        let (mut game, clock) = seeded_game(seed, RoomConfig::default(), &PLAYERS);
        play_random(&mut game, &clock, seed, 5, |_| {});
        assert_ne!(game.phase(), GamePhase::Playing, "seed {seed} did not finish");
        game.settle().unwrap();

        let record = game.record();
        assert!(record.settled);
        let replayed = record.replay().unwrap();
        assert_same_game(&replayed, &game);
    }
}

#[test]
fn test_record_bytes_round_trip() {
    let (mut game, clock) = seeded_game(42, RoomConfig::default().with_chi(true), &PLAYERS);
    play_random(&mut game, &clock, 42, 7, |_| {});
    game.settle().unwrap();

    let record = game.record();
    let bytes = record.to_bytes().unwrap();
    let decoded = GameRecord::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, record);
    assert_same_game(&decoded.replay().unwrap(), &game);
}

#[test]
fn test_stacked_game_replays() {
    let (mut game, clock) = stacked_game(
        "1D 2D 3D 4D 6D 7D 8D 9D 1T 2T 7T 8T 9T 5D",
        "5D 5D 5D 1W 2W 4W 5W 7W 8W 1T 4T 7T 2D",
        "1W 2W 3W 4W 5W 6W 7W 8W 9W 4T 5T 6T 3T",
        RoomConfig::default(),
    );
    game.process_discard("alice", tile("5D")).unwrap();
    clock.advance(1_500);
    game.process_gang("bob", tile("5D"), GangKind::Ming, Some("alice"))
        .unwrap();

    // Let Bob time out on his replacement draw.
    clock.advance(30_000);
    game.tick().unwrap();
    clock.advance(700);
    game.end_game(GameEndReason::Draw).unwrap();
    game.settle().unwrap();

    let record = game.record();
    assert!(record.stacked_wall.is_some());
    assert_eq!(record.actions.len(), 3);
    assert_eq!(record.ended.map(|(reason, _)| reason), Some(GameEndReason::Draw));

    let replayed = record.replay().unwrap();
    assert_same_game(&replayed, &game);
    assert_eq!(replayed.players()[1].consecutive_timeouts, 1);
    assert_eq!(replayed.settlement().unwrap().score_of("bob"), 2);
}

#[test]
fn test_tampered_record_fails() {
    let (mut game, _) = stacked_game(
        "1D 2D 3D 4D 6D 7D 8D 9D 1T 2T 7T 8T 9T 5D",
        "5D 5D 5D 1W 2W 4W 5W 7W 8W 1T 4T 7T 2D",
        "1W 2W 3W 4W 5W 6W 7W 8W 9W 4T 5T 6T 3T",
        RoomConfig::default(),
    );
    game.process_discard("alice", tile("5D")).unwrap();

    let mut record = game.record();
    record.actions[0].action = Action::Discard { tile: tile("9W") };
    assert!(record.replay().is_err());
}

#[test]
fn test_unstarted_game_replays_to_waiting() {
    let game = GameBuilder::new("room-w")
        .players(PLAYERS)
        .seed(5)
        .build()
        .unwrap();
    let record = game.record();
    assert_eq!(record.started_at, None);

    let replayed = record.replay().unwrap();
    assert_eq!(replayed.phase(), GamePhase::Waiting);
    assert_eq!(replayed.dealer_seat_index(), game.dealer_seat_index());
    assert_eq!(replayed.game_id(), game.game_id());
}

/// Ending a game early still replays to the same point.
#[test]
fn test_early_end_replays() {
    let (mut game, clock) = seeded_game(11, RoomConfig::default(), &PLAYERS);
    for _ in 0..4 {
        let (actor, action) = common::pick_action(&game, 0).unwrap();
        game.apply(&mahjong_engine::core::ActionRequest::new(actor, action))
            .unwrap();
        if game.phase() != GamePhase::Playing {
            break;
        }
    }
    clock.advance(2_000);
    if game.phase() == GamePhase::Playing {
        game.end_game(GameEndReason::Draw).unwrap();
    }

    let replayed = game.record().replay().unwrap();
    assert_same_game(&replayed, &game);
}
