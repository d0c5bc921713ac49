//! Room actor tests.
//!
//! Run on a paused tokio clock so turn timers fire deterministically.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{tile, tiles, PLAYERS};
use mahjong_engine::core::{
    Action, ActionOrigin, ActionRejection, ActionRequest, EngineError, Seat,
};
use mahjong_engine::game::{ActionOutcome, GameBuilder, GameEvent, GamePhase, GameState};
use mahjong_engine::room::{RoomActor, RoomError, RoomNotice, RoomSupervisor, TokioClock};
use mahjong_engine::settlement::GameEndReason;

const ALICE: &str = "1W 2W 3W 4W 5W 6W 7W 8W 9W 1T 2T 3T 4T 9D";
const BOB: &str = "1W 2W 3W 4W 5W 6W 7W 8W 9W 5T 6T 7T 8T";
const CAROL: &str = "1W 2W 3W 4W 5W 6W 7W 8W 9W 5T 6T 7T 9T";

fn room_game(room_id: &str, alice: &str, bob: &str, carol: &str) -> GameState {
    let mut prefix = tiles(alice);
    prefix.extend(tiles(bob));
    prefix.extend(tiles(carol));
    GameBuilder::new(room_id)
        .players(PLAYERS)
        .dealer(Seat::new(0))
        .stacked_wall(prefix)
        .clock(Arc::new(TokioClock::new(0)))
        .build()
        .unwrap()
}

fn discard(actor: &str, t: &str) -> ActionRequest {
    ActionRequest::new(actor, Action::Discard { tile: tile(t) })
}

#[tokio::test(start_paused = true)]
async fn test_submit_and_snapshot() {
    let mut rooms = RoomSupervisor::new();
    let handle = rooms.spawn_room(room_game("room-a", ALICE, BOB, CAROL)).unwrap();

    let snap = handle.snapshot(Some("alice")).await.unwrap();
    assert_eq!(snap.phase, GamePhase::Playing);
    assert_eq!(snap.me().unwrap().hand_count, 14);
    assert_eq!(snap.turn_deadline, Some(30_000));

    let outcome = handle.submit(discard("alice", "9D")).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Applied);

    let err = handle.submit(discard("alice", "1W")).await.unwrap_err();
    assert_eq!(
        err,
        RoomError::Engine(EngineError::InvalidAction(ActionRejection::NotYourTurn {
            expected: 1,
            actual: 0
        }))
    );

    let snap = handle.snapshot(None).await.unwrap();
    assert_eq!(snap.discard_pile, vec![tile("9D")]);
    assert_eq!(snap.current_player_index, 1);
    assert!(snap.players.iter().all(|p| p.hand.is_none()));

    assert!(matches!(
        handle.snapshot(Some("mallory")).await,
        Err(RoomError::Engine(EngineError::InvalidAction(
            ActionRejection::UnknownPlayer(_)
        )))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_timer_auto_plays() {
    let mut rooms = RoomSupervisor::new();
    let handle = rooms.spawn_room(room_game("room-t", ALICE, BOB, CAROL)).unwrap();
    let mut notices = handle.subscribe(64).await.unwrap();

    tokio::time::sleep(Duration::from_secs(31)).await;

    let snap = handle.snapshot(Some("bob")).await.unwrap();
    assert_eq!(snap.discard_pile, vec![tile("9D")]);
    assert_eq!(snap.current_player_index, 1);
    assert_eq!(snap.players[0].consecutive_timeouts, 1);

    let record = handle.record().await.unwrap();
    assert_eq!(record.actions.len(), 1);
    assert_eq!(record.actions[0].origin, ActionOrigin::Timeout);
    assert_eq!(record.actions[0].timestamp, 30_000);

    let mut seen = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        seen.push(notice);
    }
    assert!(seen.contains(&RoomNotice::Event(GameEvent::Discarded {
        seat: Seat::new(0),
        tile: tile("9D")
    })));
}

/// A player who acts in time cancels the pending timer.
#[tokio::test(start_paused = true)]
async fn test_acting_cancels_timer() {
    let mut rooms = RoomSupervisor::new();
    let handle = rooms.spawn_room(room_game("room-c", ALICE, BOB, CAROL)).unwrap();

    tokio::time::sleep(Duration::from_secs(20)).await;
    handle.submit(discard("alice", "9D")).await.unwrap();

    // Alice's old deadline passes; Bob's turn started at 20s.
    tokio::time::sleep(Duration::from_secs(15)).await;
    let record = handle.record().await.unwrap();
    assert_eq!(record.actions.len(), 1);
    let snap = handle.snapshot(Some("bob")).await.unwrap();
    assert_eq!(snap.me().unwrap().hand_count, 14);
    assert_eq!(snap.turn_deadline, Some(50_000));

    tokio::time::sleep(Duration::from_secs(16)).await;
    let record = handle.record().await.unwrap();
    assert_eq!(record.actions.len(), 2);
    assert_eq!(record.actions[1].user_id, "bob");
    assert_eq!(record.actions[1].origin, ActionOrigin::Timeout);
    assert_eq!(record.actions[1].timestamp, 50_000);
}

#[tokio::test(start_paused = true)]
async fn test_win_settles_and_notifies() {
    let mut rooms = RoomSupervisor::new();
    let handle = rooms
        .spawn_room(room_game(
            "room-w",
            "1W 2W 3W 4W 5W 6W 7W 8W 9W 1T 2T 3T 5D 5D",
            "1W 2W 3W 4W 5W 6W 7W 8W 9W 4T 5T 6T 7T",
            "1D 2D 3D 4D 6D 7D 8D 9D 1T 2T 3T 8T 9T",
        ))
        .unwrap();
    let mut notices = handle.subscribe(64).await.unwrap();

    let hu = ActionRequest::new(
        "alice",
        Action::Hu {
            tile: tile("5D"),
            self_draw: true,
        },
    );
    let outcome = handle.submit(hu).await.unwrap();
    assert_eq!(outcome, ActionOutcome::GameEnded(GameEndReason::Win));

    let mut ended = false;
    let settled = loop {
        match notices.recv().await.unwrap() {
            RoomNotice::Event(GameEvent::GameEnded { reason }) => {
                assert_eq!(reason, GameEndReason::Win);
                ended = true;
            }
            RoomNotice::Settled(result) => break result,
            RoomNotice::Event(_) => {}
        }
    };
    assert!(ended);
    assert_eq!(settled.score_of("alice"), 8);
    assert_eq!(settled.winners, vec!["alice".to_string()]);

    let snap = handle.snapshot(None).await.unwrap();
    assert_eq!(snap.phase, GamePhase::Finished);
    assert!(snap.players.iter().all(|p| p.hand.is_some()));

    let game = rooms.close_room("room-w").await.unwrap();
    assert_eq!(game.settlement(), Some(&settled));
}

#[tokio::test(start_paused = true)]
async fn test_supervisor_tracks_rooms() {
    let mut rooms = RoomSupervisor::with_inbox_capacity(4);
    rooms.spawn_room(room_game("room-1", ALICE, BOB, CAROL)).unwrap();
    let second = rooms.spawn_room(room_game("room-2", ALICE, BOB, CAROL)).unwrap();
    assert_eq!(rooms.room_count(), 2);

    let err = rooms
        .spawn_room(room_game("room-1", ALICE, BOB, CAROL))
        .unwrap_err();
    assert_eq!(err, RoomError::AlreadyExists("room-1".into()));

    let mut ids: Vec<&str> = rooms.room_ids().collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["room-1", "room-2"]);
    assert_eq!(rooms.handle("room-2").unwrap().room_id(), "room-2");
    assert!(rooms.handle("room-3").is_none());

    let game = rooms.close_room("room-2").await.unwrap();
    assert_eq!(game.phase(), GamePhase::Playing);
    assert_eq!(rooms.room_count(), 1);
    assert!(second.is_closed());
    assert_eq!(
        second.submit(discard("alice", "9D")).await.unwrap_err(),
        RoomError::Closed("room-2".into())
    );
    assert_eq!(
        rooms.close_room("room-2").await.unwrap_err(),
        RoomError::NotFound("room-2".into())
    );
}

/// Dropping every handle stops the actor and hands back the game.
#[tokio::test(start_paused = true)]
async fn test_actor_stops_when_handles_drop() {
    let (actor, handle) = RoomActor::new(room_game("room-d", ALICE, BOB, CAROL), 8);
    let task = tokio::spawn(actor.run());

    handle.submit(discard("alice", "9D")).await.unwrap();
    drop(handle);

    let game = task.await.unwrap();
    assert_eq!(game.discard_pile(), &[tile("9D")]);
    assert_eq!(game.current_player_index(), 1);
}
