//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use mahjong_engine::core::{
    Action, ActionRequest, ActionType, Clock, ManualClock, RoomConfig, Seat, Tile,
};
use mahjong_engine::game::{GameBuilder, GamePhase, GameState, TurnStage};
use mahjong_engine::player::GangKind;

pub const PLAYERS: [&str; 3] = ["alice", "bob", "carol"];

/// Clock time of the deal in stacked fixtures.
pub const START_MS: u64 = 1_000;

pub fn tile(s: &str) -> Tile {
    s.parse().unwrap()
}

pub fn tiles(s: &str) -> Vec<Tile> {
    Tile::parse_list(s).unwrap()
}

/// Deal a game whose wall starts with the given hands. Alice (seat 0) deals,
/// so her hand lists 14 tiles and the last one counts as her drawn tile.
pub fn stacked_game(alice: &str, bob: &str, carol: &str, config: RoomConfig) -> (GameState, ManualClock) {
    stacked_game_with_draws(alice, bob, carol, "", config)
}

/// Like [`stacked_game`], with `draws` placed right after the dealt hands.
pub fn stacked_game_with_draws(
    alice: &str,
    bob: &str,
    carol: &str,
    draws: &str,
    config: RoomConfig,
) -> (GameState, ManualClock) {
    let mut prefix = tiles(alice);
    assert_eq!(prefix.len(), 14, "dealer hand");
    let bob = tiles(bob);
    assert_eq!(bob.len(), 13, "bob hand");
    let carol = tiles(carol);
    assert_eq!(carol.len(), 13, "carol hand");
    prefix.extend(bob);
    prefix.extend(carol);
    if !draws.is_empty() {
        prefix.extend(tiles(draws));
    }

    let clock = ManualClock::new(START_MS);
    let mut game = GameBuilder::new("room-1")
        .players(PLAYERS)
        .room_config(config)
        .dealer(Seat::new(0))
        .stacked_wall(prefix)
        .clock(Arc::new(clock.clone()))
        .build()
        .unwrap();
    game.deal_initial_tiles().unwrap();
    (game, clock)
}

/// Deal a shuffled game.
pub fn seeded_game(seed: u64, config: RoomConfig, players: &[&str]) -> (GameState, ManualClock) {
    let clock = ManualClock::new(START_MS);
    let mut game = GameBuilder::new(format!("room-{seed}"))
        .players(players.iter().copied())
        .room_config(config)
        .seed(seed)
        .clock(Arc::new(clock.clone()))
        .build()
        .unwrap();
    game.deal_initial_tiles().unwrap();
    (game, clock)
}

/// Every concrete action some awaited player may submit right now.
pub fn legal_actions(game: &GameState) -> Vec<(String, Action)> {
    let mut out = Vec::new();
    for player in game.players() {
        let id = player.user_id.clone();
        for &action_type in &player.available_actions {
            match (action_type, game.stage()) {
                (ActionType::Discard, _) => {
                    let mut hand = player.hand().to_vec();
                    hand.dedup();
                    for tile in hand {
                        out.push((id.clone(), Action::Discard { tile }));
                    }
                }
                (ActionType::Hu, TurnStage::Discard) => {
                    if let Some(tile) = player.last_drawn_tile {
                        out.push((id.clone(), Action::Hu { tile, self_draw: true }));
                    }
                }
                (ActionType::Gang, TurnStage::Discard) => {
                    for tile in player.concealed_gang_candidates() {
                        out.push((id.clone(), Action::Gang { tile, kind: GangKind::An, from: None }));
                    }
                    for tile in player.upgrade_gang_candidates() {
                        out.push((id.clone(), Action::Gang { tile, kind: GangKind::Bu, from: None }));
                    }
                }
                (ActionType::Hu, TurnStage::Claim(window)) => {
                    out.push((id.clone(), Action::Hu { tile: window.tile(), self_draw: false }));
                }
                (ActionType::Gang, TurnStage::Claim(window)) => {
                    let from = game.players()[window.discarder().index()].user_id.clone();
                    out.push((
                        id.clone(),
                        Action::Gang { tile: window.tile(), kind: GangKind::Ming, from: Some(from) },
                    ));
                }
                (ActionType::Peng, TurnStage::Claim(window)) => {
                    let from = game.players()[window.discarder().index()].user_id.clone();
                    out.push((id.clone(), Action::Peng { tile: window.tile(), from }));
                }
                (ActionType::Chi, TurnStage::Claim(window)) => {
                    let from = game.players()[window.discarder().index()].user_id.clone();
                    for sequence in player.chi_sequences(window.tile()) {
                        out.push((
                            id.clone(),
                            Action::Chi { tile: window.tile(), sequence, from: from.clone() },
                        ));
                    }
                }
                (ActionType::Pass, TurnStage::Claim(_)) => {
                    out.push((id.clone(), Action::Pass));
                }
                _ => {}
            }
        }
    }
    out
}

/// Pick one legal action by index, wrapping around.
pub fn pick_action(game: &GameState, choice: usize) -> Option<(String, Action)> {
    let actions = legal_actions(game);
    if actions.is_empty() {
        return None;
    }
    Some(actions[choice % actions.len()].clone())
}

/// Upper bound on steps for a randomly played game.
pub const MAX_STEPS: usize = 2_000;

/// Play until the game leaves Playing, choosing actions from a seeded
/// stream. Every `tick_every`-th step lets the turn time out instead.
/// `check` runs after every step. Returns the number of steps taken.
pub fn play_random(
    game: &mut GameState,
    clock: &ManualClock,
    seed: u64,
    tick_every: usize,
    mut check: impl FnMut(&GameState),
) -> usize {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut steps = 0;
    while game.phase() == GamePhase::Playing && steps < MAX_STEPS {
        steps += 1;
        if tick_every > 0 && steps % tick_every == 0 {
            if let Some(deadline) = game.next_deadline() {
                clock.set(deadline.max(clock.now_millis()));
            }
            game.tick().unwrap();
        } else {
            let (actor, action) = pick_action(game, rng.gen()).expect("a legal action");
            game.apply(&ActionRequest::new(actor, action)).unwrap();
            clock.advance(rng.gen_range(50..2_000));
        }
        check(game);
    }
    steps
}
