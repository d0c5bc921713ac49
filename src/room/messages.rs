//! Messages between room handles and the room actor.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::core::{ActionRequest, EngineError, EngineResult};
use crate::game::{ActionOutcome, GameEvent, GameRecord, GameSnapshot};
use crate::settlement::SettlementResult;

/// Requests a room actor accepts.
#[derive(Debug)]
pub enum RoomMessage {
    /// Apply a player's action.
    Submit {
        request: ActionRequest,
        reply: oneshot::Sender<EngineResult<ActionOutcome>>,
    },

    /// Snapshot for a seated viewer, or the public view for `None`.
    Snapshot {
        viewer: Option<String>,
        reply: oneshot::Sender<EngineResult<GameSnapshot>>,
    },

    /// Replayable record of the game so far.
    Record { reply: oneshot::Sender<GameRecord> },

    /// Receive notices for every later event.
    Subscribe { sender: mpsc::Sender<RoomNotice> },

    /// Stop the actor.
    Shutdown,
}

/// Pushed to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum RoomNotice {
    Event(GameEvent),
    Settled(SettlementResult),
}

/// Errors seen by a [`RoomHandle`](super::RoomHandle).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RoomError {
    #[error("room '{0}' is closed")]
    Closed(String),

    #[error("room '{0}' already exists")]
    AlreadyExists(String),

    #[error("room '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
