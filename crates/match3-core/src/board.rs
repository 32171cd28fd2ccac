//! The tile grid.
//!
//! This module contains:
//! - The `Board` grid container with positional queries
//! - Swap, removal and single-step gravity primitives
//! - `BoardSnapshot`, a serializable copy of the grid for presentation layers
//! - `BoardError`, the error taxonomy for grid operations
//!
//! The board keeps a tile id → position index next to the grid, so tiles
//! never need a reference back into the grid to know where they are.

use crate::position::{Direction, Position};
use crate::tile::{Tile, TileId, TileKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Default minimum run length
pub const DEFAULT_MIN_RUN_LENGTH: usize = 3;

/// Errors raised by grid operations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BoardError {
    #[error("Position {row},{column} is outside the board")]
    OutOfBounds { row: usize, column: usize },

    #[error("Invalid swap")]
    InvalidSwap,

    #[error("Tile {0} is not on the board")]
    UnknownTile(TileId),

    #[error("Tile {0} is already on the board")]
    DuplicateTile(TileId),

    #[error("Cell {row},{column} is already occupied")]
    CellOccupied { row: usize, column: usize },

    #[error("Board dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Minimum run length must be at least 2, got {0}")]
    InvalidRunLength(usize),

    #[error("Bad board text: {0}")]
    BadBoardText(String),
}

/// A `width × height` grid of cells, each empty or holding one tile
#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    min_run_length: usize,
    /// Row-major cells
    cells: Vec<Option<Tile>>,
    /// Where each tile currently sits
    positions: HashMap<TileId, Position>,
}

impl Board {
    /// Create an empty board
    pub fn new(width: usize, height: usize, min_run_length: usize) -> Result<Self, BoardError> {
        if width == 0 || height == 0 {
            return Err(BoardError::InvalidDimensions { width, height });
        }
        if min_run_length < 2 {
            return Err(BoardError::InvalidRunLength(min_run_length));
        }

        Ok(Self {
            width,
            height,
            min_run_length,
            cells: vec![None; width * height],
            positions: HashMap::with_capacity(width * height),
        })
    }

    /// Build a board from text rows, one letter per cell (`G O P R Y`) and
    /// `.` for an empty cell. Whitespace inside a row is ignored.
    ///
    /// ```
    /// use match3_core::Board;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    /// let board = Board::from_rows(&["RRG", "G.P"], 3, &mut rng).unwrap();
    /// assert_eq!(board.width(), 3);
    /// assert_eq!(board.tile_count(), 5);
    /// ```
    pub fn from_rows(
        rows: &[&str],
        min_run_length: usize,
        rng: &mut impl Rng,
    ) -> Result<Self, BoardError> {
        let parsed: Vec<Vec<char>> = rows
            .iter()
            .map(|row| row.chars().filter(|c| !c.is_whitespace()).collect())
            .collect();

        let height = parsed.len();
        let width = parsed.first().map_or(0, Vec::len);
        let mut board = Self::new(width, height, min_run_length)?;

        for (row, letters) in parsed.iter().enumerate() {
            if letters.len() != width {
                return Err(BoardError::BadBoardText(format!(
                    "row {} has {} cells, expected {}",
                    row,
                    letters.len(),
                    width
                )));
            }

            for (column, &c) in letters.iter().enumerate() {
                if c == '.' {
                    continue;
                }
                let kind = TileKind::from_char(c).ok_or_else(|| {
                    BoardError::BadBoardText(format!("unknown tile '{}' at {},{}", c, row, column))
                })?;
                board.place(Position::new(row, column), Tile::new(kind, rng))?;
            }
        }

        Ok(board)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Shortest run of equal kinds that counts as a match
    pub fn min_run_length(&self) -> usize {
        self.min_run_length
    }

    /// Number of tiles currently on the board
    pub fn tile_count(&self) -> usize {
        self.positions.len()
    }

    /// Whether every cell holds a tile
    pub fn is_full(&self) -> bool {
        self.positions.len() == self.cells.len()
    }

    pub fn contains(&self, position: Position) -> bool {
        position.row < self.height && position.column < self.width
    }

    fn index(&self, position: Position) -> Result<usize, BoardError> {
        if self.contains(position) {
            Ok(position.row * self.width + position.column)
        } else {
            Err(BoardError::OutOfBounds {
                row: position.row,
                column: position.column,
            })
        }
    }

    /// The tile in a cell, `None` when the cell is empty
    pub fn cell_at(&self, position: Position) -> Result<Option<&Tile>, BoardError> {
        let idx = self.index(position)?;
        Ok(self.cells[idx].as_ref())
    }

    /// Look a tile up by id
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        let position = self.positions.get(&id)?;
        self.cells[position.row * self.width + position.column].as_ref()
    }

    /// Where a tile currently sits
    pub fn position_of(&self, id: TileId) -> Option<Position> {
        self.positions.get(&id).copied()
    }

    /// The tile in the cell adjacent to `id` in `direction`.
    ///
    /// Returns `None` at the grid edge, for an empty neighbour cell, or when
    /// `id` is not on the board.
    pub fn neighbor_of(&self, id: TileId, direction: Direction) -> Option<&Tile> {
        let position = self.position_of(id)?;
        let next = direction.step(position, self.width, self.height)?;
        self.cells[next.row * self.width + next.column].as_ref()
    }

    /// Directions a tile may be dragged in: the neighbour must exist and be of
    /// a different kind. Whether the swap forms a run is not checked here.
    pub fn available_directions(&self, id: TileId) -> Vec<Direction> {
        let Some(tile) = self.tile(id) else {
            return Vec::new();
        };

        Direction::ALL
            .into_iter()
            .filter(|&dir| {
                self.neighbor_of(id, dir)
                    .is_some_and(|neighbor| neighbor.kind != tile.kind)
            })
            .collect()
    }

    /// Put a tile into an empty cell
    pub fn place(&mut self, position: Position, tile: Tile) -> Result<(), BoardError> {
        let idx = self.index(position)?;
        if self.cells[idx].is_some() {
            return Err(BoardError::CellOccupied {
                row: position.row,
                column: position.column,
            });
        }
        if self.positions.contains_key(&tile.id) {
            return Err(BoardError::DuplicateTile(tile.id));
        }

        self.cells[idx] = Some(tile);
        self.positions.insert(tile.id, position);
        Ok(())
    }

    /// Spawn a tile of a random kind into an empty cell
    pub fn spawn_at(&mut self, position: Position, rng: &mut impl Rng) -> Result<Tile, BoardError> {
        let tile = Tile::random(rng);
        self.place(position, tile)?;
        Ok(tile)
    }

    /// Fill every empty cell with a random tile
    pub fn fill_random(&mut self, rng: &mut impl Rng) -> Vec<Tile> {
        self.empty_cells()
            .into_iter()
            .filter_map(|position| self.spawn_at(position, rng).ok())
            .collect()
    }

    /// Exchange the cells of two tiles. Both must be on the board.
    pub fn swap(&mut self, a: TileId, b: TileId) -> Result<(), BoardError> {
        if a == b {
            return Err(BoardError::InvalidSwap);
        }
        let pos_a = self.position_of(a).ok_or(BoardError::UnknownTile(a))?;
        let pos_b = self.position_of(b).ok_or(BoardError::UnknownTile(b))?;

        let idx_a = self.index(pos_a)?;
        let idx_b = self.index(pos_b)?;
        self.cells.swap(idx_a, idx_b);
        self.positions.insert(a, pos_b);
        self.positions.insert(b, pos_a);
        Ok(())
    }

    /// Empty a cell, handing back the tile that was there.
    ///
    /// An already-empty cell is not an error: a tile shared by a horizontal
    /// and a vertical run is removed by whichever run gets there first.
    pub fn remove_at(&mut self, position: Position) -> Result<Option<Tile>, BoardError> {
        let idx = self.index(position)?;
        let removed = self.cells[idx].take();
        if let Some(tile) = &removed {
            self.positions.remove(&tile.id);
        }
        Ok(removed)
    }

    /// Move a tile one cell down if the cell below is in bounds and empty.
    ///
    /// Returns whether the tile moved. Compacting a whole column means calling
    /// this repeatedly on each tile, working from the bottom of the column up,
    /// so no tile moves twice through the same gap in one pass.
    pub fn fall_one_step(&mut self, id: TileId) -> bool {
        let Some(position) = self.position_of(id) else {
            return false;
        };
        let Some(below) = Direction::Down.step(position, self.width, self.height) else {
            return false;
        };

        let from = position.row * self.width + position.column;
        let to = below.row * self.width + below.column;
        if self.cells[to].is_some() {
            return false;
        }

        self.cells.swap(from, to);
        self.positions.insert(id, below);
        true
    }

    /// All empty cells in row-major order
    pub fn empty_cells(&self) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(idx, _)| Position::new(idx / self.width, idx % self.width))
            .collect()
    }

    /// Whether every occupied cell of `column` rests on another tile or the
    /// floor, i.e. there is no gap below any tile
    pub fn column_is_compact(&self, column: usize) -> bool {
        let mut seen_tile = false;
        for row in 0..self.height {
            let occupied = self.cells[row * self.width + column].is_some();
            if seen_tile && !occupied {
                return false;
            }
            seen_tile |= occupied;
        }
        true
    }

    /// Tiles of one column from top to bottom, skipping empty cells
    pub fn column_tiles(&self, column: usize) -> Vec<TileId> {
        (0..self.height)
            .filter_map(|row| self.cells[row * self.width + column].map(|t| t.id))
            .collect()
    }

    /// Iterate over occupied cells in row-major order
    pub fn tiles(&self) -> impl Iterator<Item = (Position, &Tile)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            cell.as_ref()
                .map(|tile| (Position::new(idx / self.width, idx % self.width), tile))
        })
    }

    /// Serializable copy of the grid
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            width: self.width,
            height: self.height,
            min_run_length: self.min_run_length,
            rows: self
                .cells
                .chunks(self.width)
                .map(|row| row.to_vec())
                .collect(),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.chunks(self.width).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                let c = cell.map_or('.', |tile| tile.kind.to_char());
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

/// Grid contents at a point in time, for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub width: usize,
    pub height: usize,
    pub min_run_length: usize,
    pub rows: Vec<Vec<Option<Tile>>>,
}
