//! Owner of every live room.

use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tracing::info;

use super::actor::{RoomActor, DEFAULT_INBOX_CAPACITY};
use super::handle::RoomHandle;
use super::messages::RoomError;
use crate::game::GameState;

struct RoomEntry {
    handle: RoomHandle,
    task: JoinHandle<GameState>,
}

/// Spawns room actors and keeps their handles. Rooms share nothing; the
/// supervisor only routes by room id.
pub struct RoomSupervisor {
    rooms: FxHashMap<String, RoomEntry>,
    inbox_capacity: usize,
}

impl Default for RoomSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomSupervisor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_inbox_capacity(DEFAULT_INBOX_CAPACITY)
    }

    #[must_use]
    pub fn with_inbox_capacity(inbox_capacity: usize) -> Self {
        Self {
            rooms: FxHashMap::default(),
            inbox_capacity,
        }
    }

    /// Spawn an actor for `game` on the current tokio runtime.
    pub fn spawn_room(&mut self, game: GameState) -> Result<RoomHandle, RoomError> {
        let room_id = game.room_id().to_string();
        if self.rooms.contains_key(&room_id) {
            return Err(RoomError::AlreadyExists(room_id));
        }
        let (actor, handle) = RoomActor::new(game, self.inbox_capacity);
        let task = tokio::spawn(actor.run());
        info!(%room_id, rooms = self.rooms.len() + 1, "Room spawned");
        self.rooms.insert(
            room_id,
            RoomEntry {
                handle: handle.clone(),
                task,
            },
        );
        Ok(handle)
    }

    #[must_use]
    pub fn handle(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|entry| entry.handle.clone())
    }

    /// Stop a room and return its final game state.
    pub async fn close_room(&mut self, room_id: &str) -> Result<GameState, RoomError> {
        let entry = self
            .rooms
            .remove(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;
        // A closed inbox means the actor already stopped on its own.
        let _ = entry.handle.shutdown().await;
        let game = entry
            .task
            .await
            .map_err(|_| RoomError::Closed(room_id.to_string()))?;
        info!(%room_id, phase = ?game.phase(), "Room closed");
        Ok(game)
    }

    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Ids of every live room.
    pub fn room_ids(&self) -> impl Iterator<Item = &str> {
        self.rooms.keys().map(String::as_str)
    }
}
