//! The tile wall: a shuffled deck plus a draw cursor.
//!
//! The wall is built once per game from the room's [`TileSet`] and shuffled
//! with the game seed, so the same seed always deals the same game. Drawing
//! never removes tiles from the backing vector; it only advances the cursor,
//! which keeps the dealt order available for audit.
//!
//! ```
//! use mahjong_engine::core::TileSet;
//! use mahjong_engine::wall::TileWall;
//!
//! let mut wall = TileWall::new(TileSet::AllSuits);
//! wall.shuffle(42);
//! let hand = wall.draw_many(13).unwrap();
//! assert_eq!(hand.len(), 13);
//! assert_eq!(wall.remaining(), 95);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, EngineResult, GameRng, Tile, TileCounts, TileSet, COPIES_PER_TILE};

/// Deterministic deck with a draw cursor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileWall {
    tiles: Vec<Tile>,
    draw_cursor: usize,
    random_seed: Option<u64>,
    tile_set: TileSet,
}

impl TileWall {
    /// Build an unshuffled wall in canonical order.
    #[must_use]
    pub fn new(tile_set: TileSet) -> Self {
        Self {
            tiles: tile_set.canonical_tiles(),
            draw_cursor: 0,
            random_seed: None,
            tile_set,
        }
    }

    /// Build and shuffle in one step.
    #[must_use]
    pub fn shuffled(tile_set: TileSet, seed: u64) -> Self {
        let mut wall = Self::new(tile_set);
        wall.shuffle(seed);
        wall
    }

    /// Build an unshuffled wall that starts with `prefix`.
    ///
    /// The rest of the set follows in canonical order. Fails with
    /// `InvalidConfig` if `prefix` uses a tile outside the set or more copies
    /// of a tile than the set holds.
    pub fn stacked(tile_set: TileSet, prefix: &[Tile]) -> EngineResult<Self> {
        let mut left = TileCounts::new();
        for tile in tile_set.canonical_tiles() {
            left.add(tile);
        }
        for &tile in prefix {
            if !tile_set.contains(tile) {
                return Err(EngineError::InvalidConfig(format!(
                    "tile {tile} is not part of {tile_set:?}"
                )));
            }
            if !left.remove(tile) {
                return Err(EngineError::InvalidConfig(format!(
                    "more than {COPIES_PER_TILE} copies of {tile} in stacked wall"
                )));
            }
        }

        let mut tiles = prefix.to_vec();
        for (tile, count) in left.iter() {
            tiles.extend(std::iter::repeat(tile).take(count as usize));
        }
        Ok(Self {
            tiles,
            draw_cursor: 0,
            random_seed: None,
            tile_set,
        })
    }

    /// Restore the full set and permute it with a seeded Fisher–Yates shuffle.
    ///
    /// Resets the draw cursor.
    pub fn shuffle(&mut self, seed: u64) {
        self.tiles = self.tile_set.canonical_tiles();
        let mut rng = GameRng::new(seed).for_context("wall");
        rng.shuffle(&mut self.tiles);
        self.draw_cursor = 0;
        self.random_seed = Some(seed);
    }

    /// Draw the next tile.
    pub fn draw(&mut self) -> EngineResult<Tile> {
        let tile = *self
            .tiles
            .get(self.draw_cursor)
            .ok_or(EngineError::InsufficientTiles {
                requested: 1,
                remaining: 0,
            })?;
        self.draw_cursor += 1;
        Ok(tile)
    }

    /// Draw `n` tiles, or none at all if fewer than `n` remain.
    pub fn draw_many(&mut self, n: usize) -> EngineResult<Vec<Tile>> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(EngineError::InsufficientTiles {
                requested: n,
                remaining,
            });
        }
        let drawn = self.tiles[self.draw_cursor..self.draw_cursor + n].to_vec();
        self.draw_cursor += n;
        Ok(drawn)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.tiles.len() - self.draw_cursor
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether exactly one tile is left.
    #[must_use]
    pub fn is_last_tile(&self) -> bool {
        self.remaining() == 1
    }

    /// Size of the full deck.
    #[must_use]
    pub fn total(&self) -> usize {
        self.tiles.len()
    }

    /// Undrawn tiles in draw order.
    #[must_use]
    pub fn peek_remaining(&self) -> &[Tile] {
        &self.tiles[self.draw_cursor..]
    }

    #[must_use]
    pub fn draw_cursor(&self) -> usize {
        self.draw_cursor
    }

    /// Seed of the last shuffle, `None` for canonical or stacked walls.
    #[must_use]
    pub fn random_seed(&self) -> Option<u64> {
        self.random_seed
    }

    #[must_use]
    pub fn tile_set(&self) -> TileSet {
        self.tile_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_sizes() {
        assert_eq!(TileWall::new(TileSet::AllSuits).remaining(), 108);
        assert_eq!(TileWall::new(TileSet::WanOnly).total(), 36);
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let a = TileWall::shuffled(TileSet::AllSuits, 7);
        let b = TileWall::shuffled(TileSet::AllSuits, 7);
        let c = TileWall::shuffled(TileSet::AllSuits, 8);

        assert_eq!(a.peek_remaining(), b.peek_remaining());
        assert_ne!(a.peek_remaining(), c.peek_remaining());
        assert_eq!(a.random_seed(), Some(7));
    }

    #[test]
    fn test_shuffle_preserves_multiset() {
        let wall = TileWall::shuffled(TileSet::AllSuits, 99);
        let counts = TileCounts::from_tiles(wall.peek_remaining());
        assert_eq!(counts.total(), 108);
        assert!(counts.iter().all(|(_, c)| c as usize == COPIES_PER_TILE));
    }

    #[test]
    fn test_shuffle_resets_cursor() {
        let mut wall = TileWall::shuffled(TileSet::WanOnly, 1);
        wall.draw_many(10).unwrap();
        wall.shuffle(1);
        assert_eq!(wall.remaining(), 36);
    }

    #[test]
    fn test_over_draw_leaves_wall_untouched() {
        let mut wall = TileWall::shuffled(TileSet::WanOnly, 3);
        wall.draw_many(30).unwrap();

        let err = wall.draw_many(7).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientTiles {
                requested: 7,
                remaining: 6
            }
        );
        assert_eq!(wall.draw_cursor(), 30);
        assert_eq!(wall.remaining(), 6);
    }

    #[test]
    fn test_draw_until_empty() {
        let mut wall = TileWall::new(TileSet::WanOnly);
        for _ in 0..35 {
            wall.draw().unwrap();
        }
        assert!(wall.is_last_tile());
        wall.draw().unwrap();
        assert!(wall.is_empty());
        assert!(matches!(
            wall.draw(),
            Err(EngineError::InsufficientTiles { requested: 1, remaining: 0 })
        ));
    }

    #[test]
    fn test_stacked_wall() {
        let prefix = Tile::parse_list("9D 9D 1W").unwrap();
        let mut wall = TileWall::stacked(TileSet::AllSuits, &prefix).unwrap();
        assert_eq!(wall.total(), 108);
        assert_eq!(wall.draw_many(3).unwrap(), prefix);
        assert_eq!(wall.draw().unwrap(), "1W".parse().unwrap());

        let five = Tile::parse_list("1W 1W 1W 1W 1W").unwrap();
        assert!(TileWall::stacked(TileSet::AllSuits, &five).is_err());

        let foreign = Tile::parse_list("1D").unwrap();
        assert!(TileWall::stacked(TileSet::WanOnly, &foreign).is_err());
    }
}
