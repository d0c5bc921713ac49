//! Cloneable handle to a running room actor.

use tokio::sync::{mpsc, oneshot};

use super::messages::{RoomError, RoomMessage, RoomNotice};
use crate::core::ActionRequest;
use crate::game::{ActionOutcome, GameRecord, GameSnapshot};

#[derive(Clone, Debug)]
pub struct RoomHandle {
    room_id: String,
    sender: mpsc::Sender<RoomMessage>,
}

impl RoomHandle {
    pub(super) fn new(room_id: String, sender: mpsc::Sender<RoomMessage>) -> Self {
        Self { room_id, sender }
    }

    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Whether the actor has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, message: RoomMessage) -> Result<(), RoomError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomMessage,
    ) -> Result<T, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))
    }

    /// Submit an action and wait for the engine's verdict.
    pub async fn submit(&self, request: ActionRequest) -> Result<ActionOutcome, RoomError> {
        let outcome = self
            .request(|reply| RoomMessage::Submit { request, reply })
            .await?;
        Ok(outcome?)
    }

    /// Snapshot for `viewer`, or the public view for `None`.
    pub async fn snapshot(&self, viewer: Option<&str>) -> Result<GameSnapshot, RoomError> {
        let viewer = viewer.map(str::to_string);
        let snapshot = self
            .request(|reply| RoomMessage::Snapshot { viewer, reply })
            .await?;
        Ok(snapshot?)
    }

    pub async fn record(&self) -> Result<GameRecord, RoomError> {
        self.request(|reply| RoomMessage::Record { reply }).await
    }

    /// Receive notices for events from now on.
    pub async fn subscribe(&self, capacity: usize) -> Result<mpsc::Receiver<RoomNotice>, RoomError> {
        let (sender, receiver) = mpsc::channel(capacity);
        self.send(RoomMessage::Subscribe { sender }).await?;
        Ok(receiver)
    }

    /// Ask the actor to stop. Pending requests already queued are dropped.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomMessage::Shutdown).await
    }
}
