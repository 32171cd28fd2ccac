//! Move search.
//!
//! Finds swaps that would form at least one run. Used by the autoplayer and
//! available to presentation layers that want to highlight a move.
//! - Random: any scoring swap
//! - Greedy: the swap that clears the most tiles on its first scan

use crate::board::Board;
use crate::lines;
use crate::position::Direction;
use crate::tile::TileId;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// A swap that would score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringSwap {
    pub initiator: TileId,
    pub direction: Direction,
    pub opponent: TileId,
    /// Distinct tiles the first scan after the swap would clear
    pub clears: usize,
}

/// Every available swap that forms a run, in row-major order of the
/// initiator. Each pair is listed once, from its upper/left tile.
pub fn scoring_swaps(board: &Board) -> Vec<ScoringSwap> {
    let mut swaps = Vec::new();

    for (_, tile) in board.tiles() {
        for direction in board.available_directions(tile.id) {
            // Down and Right cover every pair exactly once
            if !matches!(direction, Direction::Down | Direction::Right) {
                continue;
            }
            let Some(opponent) = board.neighbor_of(tile.id, direction).map(|t| t.id) else {
                continue;
            };

            let mut preview = board.clone();
            if preview.swap(tile.id, opponent).is_err() {
                continue;
            }
            let runs = lines::scan(&preview);
            if runs.is_empty() {
                continue;
            }

            swaps.push(ScoringSwap {
                initiator: tile.id,
                direction,
                opponent,
                clears: lines::distinct_tiles(&runs),
            });
        }
    }

    swaps
}

/// How the hinter picks among scoring swaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintStrategy {
    Random,
    Greedy,
}

/// Picks a swap to suggest
pub struct Hinter {
    pub strategy: HintStrategy,
    rng: StdRng,
}

impl Hinter {
    pub fn new(strategy: HintStrategy) -> Self {
        Self {
            strategy,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(strategy: HintStrategy, seed: u64) -> Self {
        Self {
            strategy,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Suggest a swap, or `None` when no swap scores
    pub fn suggest(&mut self, board: &Board) -> Option<ScoringSwap> {
        let swaps = scoring_swaps(board);

        match self.strategy {
            HintStrategy::Random => swaps.choose(&mut self.rng).copied(),
            HintStrategy::Greedy => {
                let best = swaps.iter().map(|s| s.clears).max()?;
                // Break ties randomly so the autoplayer doesn't always favour the top-left
                let top: Vec<&ScoringSwap> = swaps.iter().filter(|s| s.clears == best).collect();
                top.choose(&mut self.rng).map(|s| **s)
            }
        }
    }

    /// Any swap that is merely available, for boards with no scoring move
    pub fn any_available(&mut self, board: &Board) -> Option<(TileId, TileId)> {
        let pairs: Vec<(TileId, TileId)> = board
            .tiles()
            .flat_map(|(_, tile)| {
                board
                    .available_directions(tile.id)
                    .into_iter()
                    .filter_map(move |dir| board.neighbor_of(tile.id, dir).map(|n| (tile.id, n.id)))
            })
            .collect();
        pairs.choose(&mut self.rng).copied()
    }
}
