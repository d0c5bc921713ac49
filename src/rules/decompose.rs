//! Hand decomposition.
//!
//! A standard winning hand splits into one pair plus sets, where a set is a
//! triplet or a run of three consecutive tiles in one suit. A hand can have
//! more than one split (`111222333W` is three triplets or three runs), and
//! the splits score differently, so [`decompositions`] enumerates all of
//! them rather than stopping at the first.
//!
//! ## Algorithm
//!
//! For every tile kind with at least two copies, remove a pair and then
//! recursively peel sets off the lowest remaining tile. The lowest tile must
//! start a triplet or a run (nothing lower is left to pair with it), which
//! keeps the search small.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Tile, TileCounts};

/// One set in a decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    /// Three of a kind.
    Triplet(Tile),
    /// Three consecutive tiles starting at the given tile.
    Run(Tile),
}

impl Group {
    #[must_use]
    pub fn is_triplet(self) -> bool {
        matches!(self, Group::Triplet(_))
    }

    /// Contains a 1 or a 9.
    #[must_use]
    pub fn has_terminal(self) -> bool {
        match self {
            Group::Triplet(t) => t.is_terminal(),
            Group::Run(start) => start.rank() == 1 || start.rank() == 7,
        }
    }
}

/// A pair plus sets covering every concealed tile.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decomposition {
    pub pair: Tile,
    pub groups: SmallVec<[Group; 4]>,
}

/// Every way to split `counts` into one pair and `sets` sets.
///
/// Returns an empty vector if the tile count is not `3 * sets + 2` or no
/// split exists.
#[must_use]
pub fn decompositions(counts: &TileCounts, sets: usize) -> Vec<Decomposition> {
    let mut found = Vec::new();
    if counts.total() != 3 * sets + 2 {
        return found;
    }

    let pair_candidates: SmallVec<[Tile; 14]> = counts
        .iter()
        .filter(|&(_, c)| c >= 2)
        .map(|(t, _)| t)
        .collect();

    for pair in pair_candidates {
        let mut rest = *counts;
        rest.remove(pair);
        rest.remove(pair);
        let mut groups = SmallVec::new();
        peel_sets(&mut rest, &mut groups, &mut |groups| {
            found.push(Decomposition {
                pair,
                groups: groups.clone(),
            });
        });
    }
    found
}

/// Whether `counts` splits into one pair and `sets` sets.
#[must_use]
pub fn is_standard_win(counts: &TileCounts, sets: usize) -> bool {
    !decompositions(counts, sets).is_empty()
}

/// Fourteen tiles made of seven pairs. Four copies count as two pairs.
#[must_use]
pub fn is_seven_pairs(counts: &TileCounts) -> bool {
    counts.total() == 14 && counts.iter().all(|(_, c)| c % 2 == 0)
}

fn peel_sets(
    counts: &mut TileCounts,
    groups: &mut SmallVec<[Group; 4]>,
    emit: &mut dyn FnMut(&SmallVec<[Group; 4]>),
) {
    let Some(low) = counts.first() else {
        emit(groups);
        return;
    };

    if counts.get(low) >= 3 {
        for _ in 0..3 {
            counts.remove(low);
        }
        groups.push(Group::Triplet(low));
        peel_sets(counts, groups, emit);
        groups.pop();
        for _ in 0..3 {
            counts.add(low);
        }
    }

    if let (Some(mid), Some(high)) = (low.offset(1), low.offset(2)) {
        if counts.get(mid) > 0 && counts.get(high) > 0 {
            counts.remove(low);
            counts.remove(mid);
            counts.remove(high);
            groups.push(Group::Run(low));
            peel_sets(counts, groups, emit);
            groups.pop();
            counts.add(low);
            counts.add(mid);
            counts.add(high);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(hand: &str) -> TileCounts {
        TileCounts::from_tiles(&Tile::parse_list(hand).unwrap())
    }

    #[test]
    fn test_simple_win() {
        let hand = counts("1W 2W 3W 4T 5T 6T 7D 8D 9D 2W 2W 2W 5D 5D");
        let found = decompositions(&hand, 4);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pair, "5D".parse().unwrap());
    }

    #[test]
    fn test_ambiguous_split_yields_both() {
        let hand = counts("1W 1W 1W 2W 2W 2W 3W 3W 3W 9D 9D");
        let found = decompositions(&hand, 3);
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|d| d.groups.iter().all(|g| g.is_triplet())));
        assert!(found.iter().any(|d| d.groups.iter().all(|g| !g.is_triplet())));
    }

    #[test]
    fn test_leftover_tiles_rejected() {
        let hand = counts("1W 2W 4W 4T 5T 6T 7D 8D 9D 2W 2W 2W 5D 5D");
        assert!(!is_standard_win(&hand, 4));
        // wrong size
        assert!(!is_standard_win(&counts("5D 5D 5D"), 1));
    }

    #[test]
    fn test_runs_do_not_wrap_suits() {
        let hand = counts("8W 9W 1T 5D 5D");
        assert!(!is_standard_win(&hand, 1));
    }

    #[test]
    fn test_pair_only() {
        assert!(is_standard_win(&counts("7T 7T"), 0));
    }

    #[test]
    fn test_seven_pairs() {
        assert!(is_seven_pairs(&counts(
            "1W 1W 3W 3W 5T 5T 5T 5T 7D 7D 8D 8D 9D 9D"
        )));
        assert!(!is_seven_pairs(&counts(
            "1W 1W 3W 3W 5T 5T 5T 6T 7D 7D 8D 8D 9D 9D"
        )));
    }

    #[test]
    fn test_terminal_groups() {
        assert!(Group::Run("7T".parse().unwrap()).has_terminal());
        assert!(!Group::Run("2T".parse().unwrap()).has_terminal());
        assert!(Group::Triplet("1D".parse().unwrap()).has_terminal());
    }
}
