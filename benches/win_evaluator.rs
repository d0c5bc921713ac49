use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mahjong_engine::core::{Action, ActionRequest, Tile, TileSet};
use mahjong_engine::game::{GameBuilder, GamePhase};
use mahjong_engine::rules::{WinContext, WinEvaluator};

fn hand(list: &str) -> Vec<Tile> {
    Tile::parse_list(list).unwrap()
}

fn bench_evaluate(c: &mut Criterion) {
    let evaluator = WinEvaluator::new(TileSet::AllSuits);
    let pure = hand("1W 1W 1W 2W 3W 4W 5W 6W 7W 8W 9W 9W 9W 5W");
    let pairs = hand("1W 1W 3W 3W 5T 5T 7T 7T 2D 2D 4D 4D 9D 9D");
    let miss = hand("1W 2W 4W 5W 7W 8W 1T 3T 5T 7T 9T 2D 4D 6D");
    let ctx = WinContext::self_draw(pure[13]);

    c.bench_function("evaluate_nine_gates", |b| {
        b.iter(|| evaluator.evaluate("p", black_box(&pure), &[], &ctx));
    });
    c.bench_function("evaluate_seven_pairs", |b| {
        b.iter(|| evaluator.evaluate("p", black_box(&pairs), &[], &ctx));
    });
    c.bench_function("is_winning_miss", |b| {
        b.iter(|| evaluator.is_winning(black_box(&miss), &[]));
    });
}

fn bench_full_game(c: &mut Criterion) {
    c.bench_function("full_game_first_action", |b| {
        b.iter(|| {
            let mut game = GameBuilder::new("bench")
                .players(["a", "b", "c"])
                .seed(42)
                .build()
                .unwrap();
            game.deal_initial_tiles().unwrap();
            while game.phase() == GamePhase::Playing {
                let player = game
                    .players()
                    .iter()
                    .find(|p| !p.available_actions.is_empty())
                    .unwrap();
                let action = match game.claim_window() {
                    Some(_) => Action::Pass,
                    None => Action::Discard {
                        tile: player.hand()[0],
                    },
                };
                let request = ActionRequest::new(player.user_id.clone(), action);
                game.apply(&request).unwrap();
            }
            game.settle().unwrap()
        });
    });
}

criterion_group!(benches, bench_evaluate, bench_full_game);
criterion_main!(benches);
