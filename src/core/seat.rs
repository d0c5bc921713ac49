//! Seat identification and per-seat data storage.
//!
//! ## Seat
//!
//! Type-safe seat index. Seats are fixed for the whole game; turn order is
//! seat order, so the "downstream" neighbour of seat `s` is `s + 1 (mod N)`.
//!
//! ## SeatMap
//!
//! Per-seat storage backed by `Vec` for O(1) access, indexable by `Seat`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Seat index, 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Seat(pub u8);

impl Seat {
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The seat that plays after this one.
    #[must_use]
    pub fn next(self, player_count: usize) -> Seat {
        Seat(((self.index() + 1) % player_count) as u8)
    }

    /// The seat that plays before this one.
    #[must_use]
    pub fn previous(self, player_count: usize) -> Seat {
        Seat(((self.index() + player_count - 1) % player_count) as u8)
    }

    /// How many turns after `from` this seat plays (0 for the same seat).
    ///
    /// ```
    /// use mahjong_engine::core::Seat;
    ///
    /// assert_eq!(Seat::new(2).distance_from(Seat::new(0), 3), 2);
    /// assert_eq!(Seat::new(0).distance_from(Seat::new(2), 3), 1);
    /// ```
    #[must_use]
    pub fn distance_from(self, from: Seat, player_count: usize) -> usize {
        (self.index() + player_count - from.index()) % player_count
    }

    /// Iterate over all seats for a game with `player_count` players.
    pub fn all(player_count: usize) -> impl Iterator<Item = Seat> {
        (0..player_count as u8).map(Seat)
    }

    /// Seats in play order starting after `from`, excluding `from` itself.
    pub fn after(from: Seat, player_count: usize) -> impl Iterator<Item = Seat> {
        (1..player_count).map(move |d| Seat(((from.index() + d) % player_count) as u8))
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seat {}", self.0)
    }
}

/// Per-seat data storage with O(1) access.
///
/// ```
/// use mahjong_engine::core::{Seat, SeatMap};
///
/// let mut net: SeatMap<i64> = SeatMap::with_value(3, 0);
/// net[Seat::new(1)] += 4;
/// assert_eq!(net[Seat::new(1)], 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatMap<T> {
    data: Vec<T>,
}

impl<T> SeatMap<T> {
    /// Create with values from a factory function.
    pub fn new(player_count: usize, factory: impl Fn(Seat) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 4, "At most 4 seats supported");

        let data = Seat::all(player_count).map(factory).collect();
        Self { data }
    }

    pub fn with_value(player_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(player_count, |_| value.clone())
    }

    pub fn with_default(player_count: usize) -> Self
    where
        T: Default,
    {
        Self::new(player_count, |_| T::default())
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    /// Iterate over `(Seat, &T)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Seat, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (Seat(i as u8), v))
    }

    /// Iterate over `(Seat, &mut T)` pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Seat, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (Seat(i as u8), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

impl<T> Index<Seat> for SeatMap<T> {
    type Output = T;

    fn index(&self, seat: Seat) -> &Self::Output {
        &self.data[seat.index()]
    }
}

impl<T> IndexMut<Seat> for SeatMap<T> {
    fn index_mut(&mut self, seat: Seat) -> &mut Self::Output {
        &mut self.data[seat.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_rotation() {
        assert_eq!(Seat::new(2).next(3), Seat::new(0));
        assert_eq!(Seat::new(0).previous(3), Seat::new(2));
        assert_eq!(Seat::new(1).next(2), Seat::new(0));
    }

    #[test]
    fn test_seats_after() {
        let order: Vec<_> = Seat::after(Seat::new(1), 3).collect();
        assert_eq!(order, vec![Seat::new(2), Seat::new(0)]);
    }

    #[test]
    fn test_distance() {
        let discarder = Seat::new(1);
        assert_eq!(Seat::new(2).distance_from(discarder, 3), 1);
        assert_eq!(Seat::new(0).distance_from(discarder, 3), 2);
        assert_eq!(discarder.distance_from(discarder, 3), 0);
    }

    #[test]
    fn test_seat_map() {
        let mut map: SeatMap<i64> = SeatMap::new(3, |s| s.index() as i64 * 10);
        assert_eq!(map[Seat::new(2)], 20);
        map[Seat::new(0)] = -5;
        let pairs: Vec<_> = map.iter().map(|(s, v)| (s.0, *v)).collect();
        assert_eq!(pairs, vec![(0, -5), (1, 10), (2, 20)]);
        assert_eq!(map.player_count(), 3);
    }

    #[test]
    #[should_panic(expected = "Must have at least 1 player")]
    fn test_seat_map_zero_players() {
        let _: SeatMap<i32> = SeatMap::with_value(0, 0);
    }
}
