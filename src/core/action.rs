//! Player actions and the action log.
//!
//! Actions are a closed enum: the engine matches every variant exhaustively,
//! so adding a new action is a compile error everywhere it must be handled.
//!
//! - [`Action`]: what a player wants to do
//! - [`ActionRequest`]: an action plus the user submitting it
//! - [`GameAction`]: an accepted action as recorded in the log

use serde::{Deserialize, Serialize};

use super::tile::Tile;
use crate::player::GangKind;

/// A player action.
///
/// ## Example
///
/// ```
/// use mahjong_engine::core::{Action, ActionType, Tile};
///
/// let discard = Action::Discard { tile: "5W".parse().unwrap() };
/// assert_eq!(discard.action_type(), ActionType::Discard);
/// assert!(!discard.is_claim());
///
/// let peng = Action::Peng { tile: "5W".parse().unwrap(), from: "alice".into() };
/// assert!(peng.is_claim());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Discard a tile from hand.
    Discard { tile: Tile },

    /// Claim a discard to form a triplet.
    Peng { tile: Tile, from: String },

    /// Declare a four-of-a-kind. `from` is set only for a claimed (Ming) gang.
    Gang {
        tile: Tile,
        kind: GangKind,
        from: Option<String>,
    },

    /// Claim the upstream discard to complete a run.
    Chi {
        tile: Tile,
        sequence: [Tile; 3],
        from: String,
    },

    /// Declare a win, on a self-drawn tile or on a discard.
    Hu { tile: Tile, self_draw: bool },

    /// Decline an open discard.
    Pass,
}

impl Action {
    #[must_use]
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::Discard { .. } => ActionType::Discard,
            Action::Peng { .. } => ActionType::Peng,
            Action::Gang { .. } => ActionType::Gang,
            Action::Chi { .. } => ActionType::Chi,
            Action::Hu { .. } => ActionType::Hu,
            Action::Pass => ActionType::Pass,
        }
    }

    /// Whether this action responds to another player's discard.
    #[must_use]
    pub fn is_claim(&self) -> bool {
        match self {
            Action::Peng { .. } | Action::Chi { .. } | Action::Pass => true,
            Action::Gang { kind, .. } => *kind == GangKind::Ming,
            Action::Hu { self_draw, .. } => !self_draw,
            Action::Discard { .. } => false,
        }
    }

    /// The tile the action is about, if any.
    #[must_use]
    pub fn tile(&self) -> Option<Tile> {
        match self {
            Action::Discard { tile }
            | Action::Peng { tile, .. }
            | Action::Gang { tile, .. }
            | Action::Chi { tile, .. }
            | Action::Hu { tile, .. } => Some(*tile),
            Action::Pass => None,
        }
    }
}

/// Action kind without payload. Used for permission sets and rejections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Discard,
    Peng,
    Gang,
    Chi,
    Hu,
    Pass,
}

/// An action submitted by a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub actor: String,
    pub action: Action,
}

impl ActionRequest {
    #[must_use]
    pub fn new(actor: impl Into<String>, action: Action) -> Self {
        Self {
            actor: actor.into(),
            action,
        }
    }
}

/// Who produced an accepted action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionOrigin {
    /// Submitted by the player.
    #[default]
    Player,
    /// Played by the engine when the turn deadline passed.
    Timeout,
    /// Played by the engine for a player in trustee mode.
    Trustee,
}

/// A recorded action with metadata for audit and replay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameAction {
    /// Position in the game's log, starting at 0.
    pub sequence: u64,

    /// Clock time in milliseconds when the action was accepted.
    pub timestamp: u64,

    pub user_id: String,

    pub action: Action,

    pub origin: ActionOrigin,
}
