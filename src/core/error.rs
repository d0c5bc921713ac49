//! Engine error taxonomy.
//!
//! Every rejected request comes back as an [`EngineError`]. All variants
//! except [`EngineError::InvariantViolation`] and [`EngineError::GameAborted`]
//! are recoverable: the state is left exactly as it was before the call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::action::ActionType;
use super::tile::Tile;
use crate::game::GamePhase;

/// Why a well-formed action was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ActionRejection {
    #[error("unknown player '{0}'")]
    UnknownPlayer(String),
    #[error("unknown tile '{0}'")]
    UnknownTile(String),
    #[error("it is seat {expected}'s turn, not seat {actual}'s")]
    NotYourTurn { expected: usize, actual: usize },
    #[error("tile {0} is not in hand")]
    TileNotHeld(Tile),
    #[error("{0:?} is disabled for this room")]
    Disallowed(ActionType),
    #[error("no discard is open to claims")]
    NothingToClaim,
    #[error("claimed tile {claimed} does not match the open discard {open}")]
    NotTopDiscard { claimed: Tile, open: Tile },
    #[error("discard came from '{actual}', not '{claimed}'")]
    WrongDiscarder { claimed: String, actual: String },
    #[error("a ming gang must name the discarder")]
    MissingDiscarder,
    #[error("seat {0} cannot respond to this discard")]
    NotEligible(usize),
    #[error("seat {0} already responded to this discard")]
    AlreadyResponded(usize),
    #[error("chi may only claim from the upstream player")]
    NotUpstream,
    #[error("invalid chi sequence {0:?}")]
    InvalidChiSequence(Vec<Tile>),
    #[error("not enough copies of {tile} for {action:?}")]
    InsufficientCopies { tile: Tile, action: ActionType },
    #[error("no exposed peng of {0} to upgrade")]
    NoPengToUpgrade(Tile),
    #[error("hand is not a winning hand")]
    NotAWinningHand,
    #[error("self-draw hu must declare the drawn tile")]
    NotDrawnTile(Tile),
    #[error("{0:?} is not possible at this point of the turn")]
    WrongStage(ActionType),
}

/// Errors returned by engine operations.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EngineError {
    /// The action is not legal for this player right now.
    #[error("invalid action: {0}")]
    InvalidAction(#[from] ActionRejection),

    /// A draw requested more tiles than the wall holds.
    #[error("insufficient tiles: requested {requested}, {remaining} remaining")]
    InsufficientTiles { requested: usize, remaining: usize },

    /// The operation does not apply to the current phase.
    #[error("cannot {attempted} while the game is {phase:?}")]
    InvalidStateTransition { phase: GamePhase, attempted: String },

    /// A room or score configuration cannot be played.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A state invariant broke. The game is aborted.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The game was aborted earlier and accepts no more mutations.
    #[error("game aborted: {0}")]
    GameAborted(String),

    /// Encoding or decoding a snapshot or record failed.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl EngineError {
    /// `false` for the fatal class (invariant violations and aborted games).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            EngineError::InvariantViolation(_) | EngineError::GameAborted(_)
        )
    }

    pub(crate) fn transition(phase: GamePhase, attempted: impl Into<String>) -> Self {
        EngineError::InvalidStateTransition {
            phase,
            attempted: attempted.into(),
        }
    }
}

impl From<bincode::Error> for EngineError {
    fn from(err: bincode::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classes() {
        let invalid = EngineError::from(ActionRejection::NotAWinningHand);
        assert!(invalid.is_recoverable());

        let over = EngineError::InsufficientTiles {
            requested: 3,
            remaining: 1,
        };
        assert!(over.is_recoverable());

        assert!(!EngineError::InvariantViolation("count".into()).is_recoverable());
        assert!(!EngineError::GameAborted("count".into()).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = EngineError::from(ActionRejection::NotYourTurn {
            expected: 1,
            actual: 2,
        });
        assert_eq!(
            err.to_string(),
            "invalid action: it is seat 1's turn, not seat 2's"
        );

        let err = EngineError::transition(GamePhase::Settlement, "discard");
        assert_eq!(err.to_string(), "cannot discard while the game is Settlement");
    }
}
