//! The room actor: sole owner and writer of one room's game.
//!
//! The actor drains a bounded inbox and sleeps until the game's next
//! deadline, whichever comes first. The timer is keyed by the `turn_seq`
//! captured when it was armed; if a message changed the game in the
//! meantime, the loop simply re-arms with the new sequence, and a late
//! firing is rejected by the engine as stale.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::handle::RoomHandle;
use super::messages::{RoomMessage, RoomNotice};
use crate::core::Clock;
use crate::game::{GamePhase, GameState, TimeoutOutcome};

/// Default inbox capacity.
pub const DEFAULT_INBOX_CAPACITY: usize = 64;

pub struct RoomActor {
    game: GameState,
    inbox: mpsc::Receiver<RoomMessage>,
    subscribers: Vec<mpsc::Sender<RoomNotice>>,
}

impl RoomActor {
    /// Create an actor for `game` and the handle that talks to it.
    #[must_use]
    pub fn new(game: GameState, capacity: usize) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(capacity.max(1));
        let handle = RoomHandle::new(game.room_id().to_string(), sender);
        let actor = Self {
            game,
            inbox,
            subscribers: Vec::new(),
        };
        (actor, handle)
    }

    /// Run until shut down or every handle is dropped. Returns the game.
    pub async fn run(mut self) -> GameState {
        info!(room_id = %self.game.room_id(), "Room actor started");

        if self.game.phase() == GamePhase::Waiting {
            if let Err(err) = self.game.deal_initial_tiles() {
                error!(room_id = %self.game.room_id(), %err, "Deal failed");
            }
        }
        self.after_change();

        loop {
            let armed_seq = self.game.turn_seq();
            let wait = self.time_to_deadline();

            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(RoomMessage::Shutdown) | None => break,
                    Some(message) => self.handle_message(message),
                },
                () = sleep_for(wait) => self.on_timer(armed_seq),
            }
            self.after_change();
        }

        info!(room_id = %self.game.room_id(), phase = ?self.game.phase(), "Room actor stopped");
        self.game
    }

    fn time_to_deadline(&self) -> Option<Duration> {
        let deadline = self.game.next_deadline()?;
        let now = self.game.clock().now_millis();
        Some(Duration::from_millis(deadline.saturating_sub(now)))
    }

    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Submit { request, reply } => {
                let result = self.game.apply(&request);
                if let Err(err) = &result {
                    debug!(
                        room_id = %self.game.room_id(),
                        actor = %request.actor,
                        %err,
                        "Action rejected"
                    );
                }
                let _ = reply.send(result);
            }
            RoomMessage::Snapshot { viewer, reply } => {
                let snapshot = match viewer {
                    Some(viewer) => self.game.snapshot(&viewer),
                    None => Ok(self.game.public_snapshot()),
                };
                let _ = reply.send(snapshot);
            }
            RoomMessage::Record { reply } => {
                let _ = reply.send(self.game.record());
            }
            RoomMessage::Subscribe { sender } => {
                self.subscribers.push(sender);
            }
            RoomMessage::Shutdown => {}
        }
    }

    fn on_timer(&mut self, armed_seq: u64) {
        match self.game.handle_timeout(armed_seq) {
            Ok(TimeoutOutcome::AutoPlayed { actions, outcome }) => {
                debug!(room_id = %self.game.room_id(), actions, ?outcome, "Auto-played on timeout");
            }
            Ok(_) => {}
            Err(err) => {
                error!(room_id = %self.game.room_id(), %err, "Timeout handling failed");
            }
        }
    }

    /// Settle a finished game and push queued events.
    fn after_change(&mut self) {
        if self.game.phase() == GamePhase::Settlement && !self.game.is_faulted() {
            match self.game.settle() {
                Ok(result) => {
                    for event in self.game.drain_events() {
                        self.notify(RoomNotice::Event(event));
                    }
                    self.notify(RoomNotice::Settled(result));
                    return;
                }
                Err(err) => error!(room_id = %self.game.room_id(), %err, "Settlement failed"),
            }
        }
        for event in self.game.drain_events() {
            self.notify(RoomNotice::Event(event));
        }
    }

    fn notify(&mut self, notice: RoomNotice) {
        let room_id = self.game.room_id();
        self.subscribers.retain(|sender| match sender.try_send(notice.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(%room_id, "Subscriber channel full, dropping notice");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}
