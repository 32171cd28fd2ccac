//! Swap validation.
//!
//! A swap is offered only between two orthogonally adjacent tiles of
//! different kinds. Whether it forms a run is left to the resolution cycle
//! (see [`crate::config::SwapPolicy`]).

use crate::board::{Board, BoardError};
use crate::engine::Resolution;
use crate::tile::TileId;
use serde::{Deserialize, Serialize};

/// What a committed swap led to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SwapOutcome {
    /// The tiles stayed swapped and the board was resolved
    Resolved {
        initiator: TileId,
        opponent: TileId,
        resolution: Resolution,
    },
    /// The swap formed no run and was undone
    Reverted { initiator: TileId, opponent: TileId },
}

impl SwapOutcome {
    /// Tiles destroyed as a consequence of the swap
    pub fn destroyed(&self) -> usize {
        match self {
            SwapOutcome::Resolved { resolution, .. } => resolution.destroyed,
            SwapOutcome::Reverted { .. } => 0,
        }
    }
}

/// Check that `initiator` may trade places with `opponent`.
///
/// Fails with [`BoardError::InvalidSwap`] when either tile is off the board,
/// the tiles are not adjacent, or they share a kind.
pub fn validate_swap(board: &Board, initiator: TileId, opponent: TileId) -> Result<(), BoardError> {
    let (Some(a), Some(b)) = (board.tile(initiator), board.tile(opponent)) else {
        return Err(BoardError::InvalidSwap);
    };
    let (Some(pos_a), Some(pos_b)) = (board.position_of(initiator), board.position_of(opponent))
    else {
        return Err(BoardError::InvalidSwap);
    };

    if !pos_a.is_adjacent(&pos_b) || a.kind == b.kind {
        return Err(BoardError::InvalidSwap);
    }
    Ok(())
}

/// Whether swapping the two tiles would leave at least one run on the board
pub fn would_form_run(board: &Board, initiator: TileId, opponent: TileId) -> bool {
    if validate_swap(board, initiator, opponent).is_err() {
        return false;
    }
    let mut preview = board.clone();
    preview.swap(initiator, opponent).is_ok() && crate::lines::has_runs(&preview)
}
