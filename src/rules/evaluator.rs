//! Win evaluation and fan counting.
//!
//! [`WinEvaluator::evaluate`] checks a declared win and, if valid, picks the
//! highest-scoring interpretation of the hand. Fan sources multiply:
//!
//! | Source | Fan |
//! |--------|-----|
//! | BasicWin | 1 |
//! | AllPungs | 2 |
//! | SevenPairs | 4 |
//! | PureSuit | 4 |
//! | AllTerminalSets | 4 |
//! | GoldenHook | 4 |
//! | Root (each) | 2 |
//! | GangFlower | 2 |
//! | LastTile | 2 |
//! | GangDischarge | 2 |
//!
//! BasicWin is listed only when no other hand type applies.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::decompose::{decompositions, is_seven_pairs, Decomposition};
use crate::core::{Tile, TileCounts, TileSet, COPIES_PER_TILE};
use crate::player::MeldSet;

/// Sets plus one pair in a complete hand.
pub const SETS_PER_HAND: usize = 4;

/// Tiles in a complete hand, counting a gang as three.
pub const WINNING_HAND_SIZE: usize = 14;

/// Structural hand types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandType {
    BasicWin,
    AllPungs,
    SevenPairs,
    PureSuit,
    AllTerminalSets,
    GoldenHook,
}

impl HandType {
    #[must_use]
    pub const fn fan(self) -> u32 {
        match self {
            HandType::BasicWin => 1,
            HandType::AllPungs => 2,
            HandType::SevenPairs
            | HandType::PureSuit
            | HandType::AllTerminalSets
            | HandType::GoldenHook => 4,
        }
    }
}

/// What contributed a fan multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FanKind {
    Hand(HandType),
    /// Four copies of one tile kind held by the winner.
    Root(Tile),
    /// Self-drawn on a gang replacement tile.
    GangFlower,
    /// Won on the last wall tile.
    LastTile,
    /// Won on a discard made right after a gang.
    GangDischarge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FanSource {
    pub kind: FanKind,
    pub fan: u32,
}

impl FanSource {
    fn hand(hand_type: HandType) -> Self {
        Self {
            kind: FanKind::Hand(hand_type),
            fan: hand_type.fan(),
        }
    }

    fn doubling(kind: FanKind) -> Self {
        Self { kind, fan: 2 }
    }
}

/// Shape of the winning hand.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinPattern {
    /// Pair plus sets; melds supply the remaining sets.
    Standard(Decomposition),
    SevenPairs,
}

/// Circumstances of the win that the tiles alone do not show.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WinContext {
    pub winning_tile: Option<Tile>,
    pub is_self_draw: bool,
    /// Discarder of the winning tile, `None` on self-draw.
    pub winning_from: Option<String>,
    /// The winning tile was a gang replacement draw.
    pub after_gang: bool,
    /// The winning tile was the last one in the wall.
    pub last_tile: bool,
    /// The winning discard was made right after the discarder's gang.
    pub gang_discharge: bool,
}

impl WinContext {
    #[must_use]
    pub fn self_draw(tile: Tile) -> Self {
        Self {
            winning_tile: Some(tile),
            is_self_draw: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn discard(tile: Tile, from: impl Into<String>) -> Self {
        Self {
            winning_tile: Some(tile),
            winning_from: Some(from.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_after_gang(mut self, flag: bool) -> Self {
        self.after_gang = flag;
        self
    }

    #[must_use]
    pub fn with_last_tile(mut self, flag: bool) -> Self {
        self.last_tile = flag;
        self
    }

    #[must_use]
    pub fn with_gang_discharge(mut self, flag: bool) -> Self {
        self.gang_discharge = flag;
        self
    }
}

/// Outcome of a win check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinResult {
    pub user_id: String,
    pub is_valid: bool,
    pub is_self_draw: bool,
    pub winning_tile: Option<Tile>,
    pub winning_from: Option<String>,
    /// Product of every fan source. 0 for an invalid hand.
    pub base_fan: u32,
    pub hand_types: Vec<HandType>,
    pub fan_sources: Vec<FanSource>,
    pub win_pattern: Option<WinPattern>,
}

impl WinResult {
    fn invalid(user_id: &str, ctx: &WinContext) -> Self {
        Self {
            user_id: user_id.to_string(),
            is_valid: false,
            is_self_draw: ctx.is_self_draw,
            winning_tile: ctx.winning_tile,
            winning_from: ctx.winning_from.clone(),
            base_fan: 0,
            hand_types: Vec::new(),
            fan_sources: Vec::new(),
            win_pattern: None,
        }
    }
}

/// Validates winning hands and counts fan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinEvaluator {
    tile_set: TileSet,
}

impl WinEvaluator {
    #[must_use]
    pub fn new(tile_set: TileSet) -> Self {
        Self { tile_set }
    }

    /// Evaluate `concealed` (including the winning tile) plus `melds`.
    ///
    /// ```
    /// use mahjong_engine::core::{Tile, TileSet};
    /// use mahjong_engine::rules::{HandType, WinContext, WinEvaluator};
    ///
    /// let evaluator = WinEvaluator::new(TileSet::AllSuits);
    /// let hand = Tile::parse_list("1W 2W 3W 4T 5T 6T 7D 8D 9D 2W 2W 2W 5D 5D").unwrap();
    /// let ctx = WinContext::self_draw("5D".parse().unwrap());
    /// let result = evaluator.evaluate("alice", &hand, &[], &ctx);
    ///
    /// assert!(result.is_valid);
    /// assert_eq!(result.hand_types, vec![HandType::BasicWin]);
    /// assert_eq!(result.base_fan, 1);
    /// ```
    #[must_use]
    pub fn evaluate(
        &self,
        user_id: &str,
        concealed: &[Tile],
        melds: &[MeldSet],
        ctx: &WinContext,
    ) -> WinResult {
        if melds.len() > SETS_PER_HAND
            || concealed.len() + 3 * melds.len() != WINNING_HAND_SIZE
            || !concealed.iter().all(|&t| self.tile_set.contains(t))
        {
            return WinResult::invalid(user_id, ctx);
        }

        let counts = TileCounts::from_tiles(concealed);
        let mut best: Option<(u32, Vec<HandType>, Vec<FanSource>, WinPattern)> = None;
        let situational = self.situational_sources(&counts, melds, ctx);

        let mut consider = |hand_types: Vec<HandType>, pattern: WinPattern| {
            let mut sources: Vec<FanSource> =
                hand_types.iter().copied().map(FanSource::hand).collect();
            sources.extend(situational.iter().copied());
            let fan = sources.iter().map(|s| s.fan).product::<u32>();
            if best.as_ref().map_or(true, |(f, ..)| fan > *f) {
                best = Some((fan, hand_types, sources, pattern));
            }
        };

        if melds.is_empty() && is_seven_pairs(&counts) {
            let mut types = vec![HandType::SevenPairs];
            if self.is_pure_suit(concealed, melds) {
                types.push(HandType::PureSuit);
            }
            consider(types, WinPattern::SevenPairs);
        }

        for decomposition in decompositions(&counts, SETS_PER_HAND - melds.len()) {
            let types = self.standard_hand_types(&decomposition, concealed, melds);
            consider(types, WinPattern::Standard(decomposition));
        }

        match best {
            Some((base_fan, hand_types, fan_sources, pattern)) => WinResult {
                user_id: user_id.to_string(),
                is_valid: true,
                is_self_draw: ctx.is_self_draw,
                winning_tile: ctx.winning_tile,
                winning_from: ctx.winning_from.clone(),
                base_fan,
                hand_types,
                fan_sources,
                win_pattern: Some(pattern),
            },
            None => WinResult::invalid(user_id, ctx),
        }
    }

    /// Structural check only.
    #[must_use]
    pub fn is_winning(&self, concealed: &[Tile], melds: &[MeldSet]) -> bool {
        self.evaluate("", concealed, melds, &WinContext::default())
            .is_valid
    }

    fn standard_hand_types(
        &self,
        decomposition: &Decomposition,
        concealed: &[Tile],
        melds: &[MeldSet],
    ) -> Vec<HandType> {
        let mut types = Vec::new();

        let all_triplets = decomposition.groups.iter().all(|g| g.is_triplet())
            && melds.iter().all(MeldSet::is_triplet);
        if all_triplets {
            types.push(HandType::AllPungs);
        }
        if self.is_pure_suit(concealed, melds) {
            types.push(HandType::PureSuit);
        }
        let all_terminal = decomposition.pair.is_terminal()
            && decomposition.groups.iter().all(|g| g.has_terminal())
            && melds.iter().all(MeldSet::has_terminal);
        if all_terminal {
            types.push(HandType::AllTerminalSets);
        }
        if melds.len() == SETS_PER_HAND {
            types.push(HandType::GoldenHook);
        }

        if types.is_empty() {
            types.push(HandType::BasicWin);
        }
        types
    }

    fn is_pure_suit(&self, concealed: &[Tile], melds: &[MeldSet]) -> bool {
        if self.tile_set == TileSet::WanOnly {
            return false;
        }
        let suit = concealed[0].suit();
        concealed.iter().all(|t| t.suit() == suit)
            && melds
                .iter()
                .flat_map(|m| m.tiles.iter())
                .all(|t| t.suit() == suit)
    }

    fn situational_sources(
        &self,
        counts: &TileCounts,
        melds: &[MeldSet],
        ctx: &WinContext,
    ) -> SmallVec<[FanSource; 4]> {
        let mut all = *counts;
        for tile in melds.iter().flat_map(|m| m.tiles.iter()) {
            all.add(*tile);
        }

        let mut sources: SmallVec<[FanSource; 4]> = all
            .iter()
            .filter(|&(_, c)| c as usize == COPIES_PER_TILE)
            .map(|(t, _)| FanSource::doubling(FanKind::Root(t)))
            .collect();
        if ctx.is_self_draw && ctx.after_gang {
            sources.push(FanSource::doubling(FanKind::GangFlower));
        }
        if ctx.last_tile {
            sources.push(FanSource::doubling(FanKind::LastTile));
        }
        if !ctx.is_self_draw && ctx.gang_discharge {
            sources.push(FanSource::doubling(FanKind::GangDischarge));
        }
        sources
    }
}
