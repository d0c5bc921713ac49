//! Claim windows: arbitration of responses to a discard.
//!
//! When a tile is discarded, every other player who could use it gets a
//! chance to respond. Responses arrive in any order; the window gathers them
//! and resolves by priority:
//!
//! 1. Hu
//! 2. Gang and Peng (equal)
//! 3. Chi
//!
//! Ties go to the claimant closest downstream of the discarder. With
//! multiple winners enabled, every Hu claim on the discard is accepted.
//!
//! ## Early resolution
//!
//! The window does not wait for everyone. It resolves as soon as no
//! unanswered claimant could beat the best claim already submitted, so a
//! Hu from the next seat resolves immediately while a Peng from the far seat
//! waits for the near seat's answer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Action, ActionRejection, ActionType, Seat, SeatMap, Tile};

/// Relative strength of a claim. Higher wins.
#[must_use]
pub fn claim_priority(action_type: ActionType) -> u8 {
    match action_type {
        ActionType::Hu => 3,
        ActionType::Gang | ActionType::Peng => 2,
        ActionType::Chi => 1,
        ActionType::Discard | ActionType::Pass => 0,
    }
}

/// One player's answer to an open discard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimResponse {
    Pass,
    Claim(Action),
}

/// How a window resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimResolution {
    /// Hu claims, closest to the discarder first.
    Winners(SmallVec<[(Seat, Action); 3]>),
    /// A single Peng, Gang or Chi.
    Meld(Seat, Action),
    /// Everyone passed.
    NoClaim,
}

/// An open discard waiting for responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimWindow {
    tile: Tile,
    discarder: Seat,
    /// Claim types each seat may submit. Empty for ineligible seats.
    options: SeatMap<BTreeSet<ActionType>>,
    responses: SeatMap<Option<ClaimResponse>>,
    multiple_winners: bool,
}

impl ClaimWindow {
    /// Open a window. Returns `None` if nobody can claim.
    #[must_use]
    pub fn open(
        tile: Tile,
        discarder: Seat,
        options: SeatMap<BTreeSet<ActionType>>,
        multiple_winners: bool,
    ) -> Option<Self> {
        if options.values().all(BTreeSet::is_empty) {
            return None;
        }
        let player_count = options.player_count();
        Some(Self {
            tile,
            discarder,
            options,
            responses: SeatMap::with_default(player_count),
            multiple_winners,
        })
    }

    #[must_use]
    pub fn tile(&self) -> Tile {
        self.tile
    }

    #[must_use]
    pub fn discarder(&self) -> Seat {
        self.discarder
    }

    /// Claim types `seat` may submit.
    #[must_use]
    pub fn options(&self, seat: Seat) -> &BTreeSet<ActionType> {
        &self.options[seat]
    }

    #[must_use]
    pub fn is_eligible(&self, seat: Seat) -> bool {
        !self.options[seat].is_empty()
    }

    #[must_use]
    pub fn has_responded(&self, seat: Seat) -> bool {
        self.responses[seat].is_some()
    }

    /// Eligible seats that have not answered, in play order after the
    /// discarder.
    #[must_use]
    pub fn pending_seats(&self) -> Vec<Seat> {
        Seat::after(self.discarder, self.player_count())
            .filter(|&s| self.is_eligible(s) && !self.has_responded(s))
            .collect()
    }

    /// Seats that may respond, in play order after the discarder.
    #[must_use]
    pub fn claimants(&self) -> Vec<Seat> {
        Seat::after(self.discarder, self.player_count())
            .filter(|&s| self.is_eligible(s))
            .collect()
    }

    fn player_count(&self) -> usize {
        self.options.player_count()
    }

    /// Record a response. The caller has already checked that a claim is
    /// legal for the player's hand.
    pub fn respond(&mut self, seat: Seat, response: ClaimResponse) -> Result<(), ActionRejection> {
        if !self.is_eligible(seat) {
            return Err(ActionRejection::NotEligible(seat.index()));
        }
        if self.has_responded(seat) {
            return Err(ActionRejection::AlreadyResponded(seat.index()));
        }
        if let ClaimResponse::Claim(action) = &response {
            let action_type = action.action_type();
            if !self.options[seat].contains(&action_type) {
                return Err(ActionRejection::Disallowed(action_type));
            }
        }
        self.responses[seat] = Some(response);
        Ok(())
    }

    /// Submitted claims as `(priority, distance, seat, action)`.
    fn submitted(&self) -> impl Iterator<Item = (u8, usize, Seat, &Action)> + '_ {
        let n = self.player_count();
        self.responses.iter().filter_map(move |(seat, response)| match response {
            Some(ClaimResponse::Claim(action)) => Some((
                claim_priority(action.action_type()),
                seat.distance_from(self.discarder, n),
                seat,
                action,
            )),
            _ => None,
        })
    }

    /// Best submitted claim as `(priority, distance)`.
    fn best(&self) -> Option<(u8, usize)> {
        self.submitted()
            .map(|(p, d, ..)| (p, d))
            .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
    }

    /// Whether the outcome can no longer change.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        let n = self.player_count();
        let best = self.best();
        self.pending_seats().into_iter().all(|seat| {
            let reach = self.options[seat]
                .iter()
                .map(|&t| claim_priority(t))
                .max()
                .unwrap_or(0);
            let distance = seat.distance_from(self.discarder, n);
            match best {
                None => false,
                Some((p, d)) => {
                    let co_winner = self.multiple_winners && p == 3 && reach == 3;
                    !(reach > p || (reach == p && distance < d) || co_winner)
                }
            }
        })
    }

    /// Final outcome. Only meaningful once [`is_resolved`](Self::is_resolved).
    #[must_use]
    pub fn resolve(&self) -> ClaimResolution {
        let Some((priority, distance)) = self.best() else {
            return ClaimResolution::NoClaim;
        };

        if priority == claim_priority(ActionType::Hu) {
            let mut winners: SmallVec<[(usize, Seat, Action); 3]> = self
                .submitted()
                .filter(|(p, ..)| *p == priority)
                .map(|(_, d, seat, action)| (d, seat, action.clone()))
                .collect();
            winners.sort_by_key(|(d, ..)| *d);
            if !self.multiple_winners {
                winners.truncate(1);
            }
            return ClaimResolution::Winners(
                winners.into_iter().map(|(_, s, a)| (s, a)).collect(),
            );
        }

        self.submitted()
            .find(|(p, d, ..)| *p == priority && *d == distance)
            .map_or(ClaimResolution::NoClaim, |(_, _, seat, action)| {
                ClaimResolution::Meld(seat, action.clone())
            })
    }
}
