//! Tile value types.
//!
//! A tile is a `(suit, rank)` pair. Tiles are `Copy`, ordered by suit then
//! rank, and serialize as their short text form (`"5W"`, `"9T"`, `"1D"`).
//!
//! ## Notation
//!
//! | Suit | Letter |
//! |------|--------|
//! | Wan (characters) | `W` |
//! | Tiao (bamboo) | `T` |
//! | Tong (dots) | `D` |
//!
//! ```
//! use mahjong_engine::core::{Suit, Tile};
//!
//! let tile: Tile = "5W".parse().unwrap();
//! assert_eq!(tile, Tile::new(Suit::Wan, 5));
//!
//! let hand = Tile::parse_list("1W 2W 3W 9D").unwrap();
//! assert_eq!(hand.len(), 4);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{de, ser, Deserialize, Serialize};

use super::error::{ActionRejection, EngineError};

/// Copies of every tile kind in a full set.
pub const COPIES_PER_TILE: usize = 4;

/// Lowest and highest rank.
pub const MIN_RANK: u8 = 1;
pub const MAX_RANK: u8 = 9;

/// Tile suit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suit {
    Wan,
    Tiao,
    Tong,
}

impl Suit {
    /// All suits in canonical order.
    pub const ALL: [Suit; 3] = [Suit::Wan, Suit::Tiao, Suit::Tong];

    /// Index of this suit in canonical order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Suit::Wan => 0,
            Suit::Tiao => 1,
            Suit::Tong => 2,
        }
    }

    /// Suit letter used in tile notation.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Suit::Wan => 'W',
            Suit::Tiao => 'T',
            Suit::Tong => 'D',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'W' => Some(Suit::Wan),
            'T' => Some(Suit::Tiao),
            'D' => Some(Suit::Tong),
            _ => None,
        }
    }
}

/// A single tile.
///
/// Construct with [`Tile::new`] (panics on an out-of-range rank) or
/// [`Tile::try_new`]. The derived ordering is the canonical hand order:
/// suit first, then rank.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tile {
    suit: Suit,
    rank: u8,
}

impl Tile {
    /// Create a tile. Panics if `rank` is outside 1..=9.
    #[must_use]
    pub fn new(suit: Suit, rank: u8) -> Self {
        assert!(
            (MIN_RANK..=MAX_RANK).contains(&rank),
            "Tile rank must be 1-9"
        );
        Self { suit, rank }
    }

    /// Create a tile, returning `None` for an out-of-range rank.
    #[must_use]
    pub fn try_new(suit: Suit, rank: u8) -> Option<Self> {
        (MIN_RANK..=MAX_RANK)
            .contains(&rank)
            .then_some(Self { suit, rank })
    }

    #[must_use]
    pub const fn suit(self) -> Suit {
        self.suit
    }

    #[must_use]
    pub const fn rank(self) -> u8 {
        self.rank
    }

    /// 1 or 9.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.rank == MIN_RANK || self.rank == MAX_RANK
    }

    /// The tile `delta` ranks away in the same suit, if it exists.
    #[must_use]
    pub fn offset(self, delta: i8) -> Option<Self> {
        let rank = self.rank as i8 + delta;
        if rank < MIN_RANK as i8 || rank > MAX_RANK as i8 {
            return None;
        }
        Some(Self {
            suit: self.suit,
            rank: rank as u8,
        })
    }

    /// Dense index 0..27 (suit-major).
    #[must_use]
    pub const fn index(self) -> usize {
        self.suit.index() * 9 + (self.rank as usize - 1)
    }

    /// Parse a whitespace-separated list such as `"1W 1W 5T"`.
    pub fn parse_list(list: &str) -> Result<Vec<Tile>, EngineError> {
        list.split_whitespace().map(str::parse).collect()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit.letter())
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Tile {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAction(ActionRejection::UnknownTile(s.to_string()));
        let mut chars = s.trim().chars();
        let rank = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(invalid)?;
        let suit = chars.next().and_then(Suit::from_letter).ok_or_else(invalid)?;
        if chars.next().is_some() {
            return Err(invalid());
        }
        Tile::try_new(suit, rank as u8).ok_or_else(invalid)
    }
}

impl ser::Serialize for Tile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct TileVisitor;

impl<'de> de::Visitor<'de> for TileVisitor {
    type Value = Tile;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("tile symbol such as \"5W\"")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.parse().map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> de::Deserialize<'de> for Tile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_str(TileVisitor)
    }
}

/// Which suits make up the deck.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileSet {
    /// Wan only: 36 tiles.
    WanOnly,
    /// Wan, Tiao and Tong: 108 tiles.
    #[default]
    AllSuits,
}

impl TileSet {
    /// Suits included in this set.
    #[must_use]
    pub fn suits(self) -> &'static [Suit] {
        match self {
            TileSet::WanOnly => &Suit::ALL[..1],
            TileSet::AllSuits => &Suit::ALL,
        }
    }

    /// Total number of tiles in the deck.
    #[must_use]
    pub fn deck_size(self) -> usize {
        self.suits().len() * MAX_RANK as usize * COPIES_PER_TILE
    }

    /// Check whether a tile belongs to this set.
    #[must_use]
    pub fn contains(self, tile: Tile) -> bool {
        self.suits().contains(&tile.suit())
    }

    /// Every tile of the deck in canonical (sorted) order.
    #[must_use]
    pub fn canonical_tiles(self) -> Vec<Tile> {
        let mut tiles = Vec::with_capacity(self.deck_size());
        for &suit in self.suits() {
            for rank in MIN_RANK..=MAX_RANK {
                for _ in 0..COPIES_PER_TILE {
                    tiles.push(Tile::new(suit, rank));
                }
            }
        }
        tiles
    }
}

/// Per-kind tile counts, indexed by [`Tile::index`].
///
/// Used by the win evaluator and the wall builder where multiset arithmetic
/// is simpler than scanning sorted vectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TileCounts([u8; 27]);

impl TileCounts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_tiles(tiles: &[Tile]) -> Self {
        let mut counts = Self::new();
        for &t in tiles {
            counts.add(t);
        }
        counts
    }

    #[must_use]
    pub fn get(&self, tile: Tile) -> u8 {
        self.0[tile.index()]
    }

    pub fn add(&mut self, tile: Tile) {
        self.0[tile.index()] += 1;
    }

    /// Remove one copy. Returns false if none was present.
    pub fn remove(&mut self, tile: Tile) -> bool {
        let slot = &mut self.0[tile.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().map(|&c| c as usize).sum()
    }

    /// The lowest tile with a non-zero count.
    #[must_use]
    pub fn first(&self) -> Option<Tile> {
        self.iter().next().map(|(t, _)| t)
    }

    /// Iterate over `(tile, count)` for every kind present, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Tile, u8)> + '_ {
        self.0.iter().enumerate().filter(|&(_, &c)| c > 0).map(|(i, &c)| {
            let suit = Suit::ALL[i / 9];
            (Tile::new(suit, (i % 9) as u8 + 1), c)
        })
    }
}
