//! Win detection and fan counting.
//!
//! - `decompose`: splits concealed tiles into a pair plus sets
//! - `evaluator`: validates a declared win and scores it
//!
//! The evaluator is pure: it sees only tiles, melds and a [`WinContext`],
//! never the game state, so the turn engine and the bench can both call it.

pub mod decompose;
pub mod evaluator;

pub use decompose::{decompositions, is_seven_pairs, is_standard_win, Decomposition, Group};
pub use evaluator::{
    FanKind, FanSource, HandType, WinContext, WinEvaluator, WinPattern, WinResult,
    SETS_PER_HAND, WINNING_HAND_SIZE,
};
