//! Grid coordinates and the four swap directions.
//!
//! Rows grow downwards (row 0 is the top of the board), columns grow to the
//! right. Gravity pulls tiles towards higher row indices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction from a tile towards one of its orthogonal neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// All directions in clockwise order starting from Up
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// The direction pointing the other way
    pub const fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// Whether this direction moves along a row
    pub const fn is_horizontal(&self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Step from `position` one cell in this direction.
    ///
    /// Returns `None` when the step would leave a `width × height` grid.
    pub fn step(&self, position: Position, width: usize, height: usize) -> Option<Position> {
        let Position { row, column } = position;
        let (row, column) = match self {
            Direction::Up => (row.checked_sub(1)?, column),
            Direction::Right => (row, column + 1),
            Direction::Down => (row + 1, column),
            Direction::Left => (row, column.checked_sub(1)?),
        };

        if row < height && column < width {
            Some(Position::new(row, column))
        } else {
            None
        }
    }
}

/// A cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    /// Create a new position
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Whether `other` shares an edge with this cell
    pub fn is_adjacent(&self, other: &Position) -> bool {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column) == 1
    }

    /// Direction leading from this cell to an adjacent `other`
    pub fn direction_to(&self, other: &Position) -> Option<Direction> {
        if !self.is_adjacent(other) {
            return None;
        }

        Some(if other.row < self.row {
            Direction::Up
        } else if other.row > self.row {
            Direction::Down
        } else if other.column < self.column {
            Direction::Left
        } else {
            Direction::Right
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}
