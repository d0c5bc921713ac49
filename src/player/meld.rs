//! Melds: tile groups a player has declared.
//!
//! A meld is either exposed (claimed from a discard, or an upgraded Peng) or
//! concealed (An gang). Tiles inside a meld are kept sorted.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Seat, Tile};

/// How a gang was formed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GangKind {
    /// Claimed discard plus three from hand.
    Ming,
    /// Four from hand, no claim.
    An,
    /// An exposed Peng upgraded with the fourth copy.
    Bu,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeldType {
    Peng,
    Gang(GangKind),
    Chi,
}

/// A declared tile group owned by one player.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeldSet {
    pub meld_type: MeldType,

    /// 3 tiles, or 4 for a gang. Sorted.
    pub tiles: SmallVec<[Tile; 4]>,

    pub concealed: bool,

    /// Seat whose discard completed this meld.
    pub claimed_from: Option<Seat>,
}

impl MeldSet {
    #[must_use]
    pub fn peng(tile: Tile, from: Seat) -> Self {
        Self {
            meld_type: MeldType::Peng,
            tiles: SmallVec::from_slice(&[tile; 3]),
            concealed: false,
            claimed_from: Some(from),
        }
    }

    /// A four-of-a-kind. An gangs are concealed, the others exposed.
    #[must_use]
    pub fn gang(tile: Tile, kind: GangKind, from: Option<Seat>) -> Self {
        Self {
            meld_type: MeldType::Gang(kind),
            tiles: SmallVec::from_slice(&[tile; 4]),
            concealed: kind == GangKind::An,
            claimed_from: from,
        }
    }

    /// A run. `sequence` is sorted before it is stored.
    #[must_use]
    pub fn chi(mut sequence: [Tile; 3], from: Seat) -> Self {
        sequence.sort();
        Self {
            meld_type: MeldType::Chi,
            tiles: SmallVec::from_slice(&sequence),
            concealed: false,
            claimed_from: Some(from),
        }
    }

    /// Turn an exposed Peng into a Bu gang. Returns false for any other meld.
    pub fn upgrade_to_gang(&mut self) -> bool {
        if self.meld_type != MeldType::Peng {
            return false;
        }
        let tile = self.tiles[0];
        self.tiles.push(tile);
        self.meld_type = MeldType::Gang(GangKind::Bu);
        true
    }

    /// The lowest tile.
    #[must_use]
    pub fn key_tile(&self) -> Tile {
        self.tiles[0]
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_gang(&self) -> bool {
        matches!(self.meld_type, MeldType::Gang(_))
    }

    /// Peng or any gang.
    #[must_use]
    pub fn is_triplet(&self) -> bool {
        !matches!(self.meld_type, MeldType::Chi)
    }

    /// Whether this is an exposed Peng of `tile`.
    #[must_use]
    pub fn is_peng_of(&self, tile: Tile) -> bool {
        self.meld_type == MeldType::Peng && self.tiles[0] == tile
    }

    /// At least one tile is a 1 or a 9.
    #[must_use]
    pub fn has_terminal(&self) -> bool {
        self.tiles.iter().any(|t| t.is_terminal())
    }
}
