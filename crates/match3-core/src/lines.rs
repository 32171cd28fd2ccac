//! Run detection.
//!
//! A run is a contiguous stretch of same-kind tiles along one row or column
//! whose length reaches the board's minimum run length. Both axes are
//! scanned with the same walk; only the traversal order differs.

use crate::board::Board;
use crate::position::Position;
use crate::tile::{TileId, TileKind};
use serde::{Deserialize, Serialize};

/// Scan axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Along a row, left to right
    Horizontal,
    /// Along a column, top to bottom
    Vertical,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];
}

/// A destroy-group: same-kind tiles, contiguous along one axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub kind: TileKind,
    pub axis: Axis,
    /// Members in scan order
    pub cells: Vec<(TileId, Position)>,
}

impl Run {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Member tile ids in scan order
    pub fn tiles(&self) -> impl Iterator<Item = TileId> + '_ {
        self.cells.iter().map(|(id, _)| *id)
    }

    /// The middle cell, used to place score effects
    pub fn center(&self) -> Position {
        self.cells[self.cells.len() / 2].1
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.cells.iter().any(|(member, _)| *member == id)
    }
}

/// Find every run on the board: all horizontal runs (top row first), then
/// all vertical runs (left column first).
///
/// A tile belonging to both a horizontal and a vertical run shows up in both
/// groups; consumers must deduplicate when destroying.
pub fn scan(board: &Board) -> Vec<Run> {
    Axis::ALL
        .into_iter()
        .flat_map(|axis| scan_axis(board, axis))
        .collect()
}

/// Find the runs along one axis
pub fn scan_axis(board: &Board, axis: Axis) -> Vec<Run> {
    let (lines, line_len) = match axis {
        Axis::Horizontal => (board.height(), board.width()),
        Axis::Vertical => (board.width(), board.height()),
    };
    let threshold = board.min_run_length();
    let mut runs = Vec::new();

    for line in 0..lines {
        let mut candidate: Vec<(TileId, Position)> = Vec::new();
        let mut candidate_kind: Option<TileKind> = None;

        for offset in 0..line_len {
            let position = match axis {
                Axis::Horizontal => Position::new(line, offset),
                Axis::Vertical => Position::new(offset, line),
            };
            // Indices come from the board's own dimensions
            let cell = board.cell_at(position).ok().flatten();

            match cell {
                Some(tile) if candidate_kind == Some(tile.kind) => {
                    candidate.push((tile.id, position));
                }
                _ => {
                    flush(&mut runs, &mut candidate, candidate_kind, axis, threshold);
                    candidate_kind = cell.map(|tile| tile.kind);
                    if let Some(tile) = cell {
                        candidate.push((tile.id, position));
                    }
                }
            }
        }

        flush(&mut runs, &mut candidate, candidate_kind, axis, threshold);
    }

    runs
}

fn flush(
    runs: &mut Vec<Run>,
    candidate: &mut Vec<(TileId, Position)>,
    kind: Option<TileKind>,
    axis: Axis,
    threshold: usize,
) {
    let cells = std::mem::take(candidate);
    if let Some(kind) = kind {
        if cells.len() >= threshold {
            runs.push(Run { kind, axis, cells });
        }
    }
}

/// Whether the board currently holds any run
pub fn has_runs(board: &Board) -> bool {
    Axis::ALL
        .into_iter()
        .any(|axis| !scan_axis(board, axis).is_empty())
}

/// Number of distinct tiles across a set of runs
pub fn distinct_tiles(runs: &[Run]) -> usize {
    let mut ids: Vec<TileId> = runs.iter().flat_map(Run::tiles).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn board(rows: &[&str]) -> Board {
        Board::from_rows(rows, 3, &mut StdRng::seed_from_u64(3)).unwrap()
    }

    fn positions(run: &Run) -> Vec<(usize, usize)> {
        run.cells.iter().map(|(_, p)| (p.row, p.column)).collect()
    }

    #[test]
    fn test_single_horizontal_run() {
        let b = board(&["RRRGP", "GOPYO", "OPYGR", "PYGRO", "YGROP"]);
        let runs = scan(&b);

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].kind, TileKind::Red);
        assert_eq!(runs[0].axis, Axis::Horizontal);
        assert_eq!(positions(&runs[0]), vec![(0, 0), (0, 1), (0, 2)]);
    }

    #[test]
    fn test_long_run_is_one_group() {
        let b = board(&["PPPPP", "GOGYO"]);
        let runs = scan(&b);

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 5);
        assert_eq!(runs[0].center(), Position::new(0, 2));
    }

    #[test]
    fn test_run_at_end_of_line_is_flushed() {
        let b = board(&["GOYYY"]);
        let runs = scan(&b);
        assert_eq!(runs.len(), 1);
        assert_eq!(positions(&runs[0]), vec![(0, 2), (0, 3), (0, 4)]);
    }

    #[test]
    fn test_gap_breaks_run() {
        let b = board(&["RR.RR", "RRR.G"]);
        let runs = scan(&b);
        assert_eq!(runs.len(), 1);
        assert_eq!(positions(&runs[0]), vec![(1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_short_candidates_are_dropped() {
        let b = board(&["RRGGRR", "OPOPOP"]);
        assert!(scan(&b).is_empty());
        assert!(!has_runs(&b));
    }

    #[test]
    fn test_vertical_run() {
        let b = board(&["RG", "RO", "RP", "GY"]);
        let runs = scan(&b);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].axis, Axis::Vertical);
        assert_eq!(positions(&runs[0]), vec![(0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn test_crossing_runs_share_a_tile() {
        let b = board(&["GRG", "RRR", "GRG"]);
        let runs = scan(&b);
        assert_eq!(runs.len(), 2);

        let shared = b.cell_at(Position::new(1, 1)).unwrap().unwrap().id;
        assert!(runs.iter().all(|run| run.contains(shared)));
        assert_eq!(distinct_tiles(&runs), 5);
    }

    #[test]
    fn test_two_runs_in_one_line() {
        let b = board(&["RRRGGG"]);
        let runs = scan(&b);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].kind, TileKind::Red);
        assert_eq!(runs[1].kind, TileKind::Green);
    }

    #[test]
    fn test_min_run_length_two() {
        let b = Board::from_rows(&["RRG"], 2, &mut StdRng::seed_from_u64(3)).unwrap();
        let runs = scan(&b);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 2);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let b = board(&["RRRG", "GOOO", "PPPY"]);
        assert_eq!(scan(&b), scan(&b));
    }
}
