//! Drag gesture tracking.
//!
//! Turns pointer positions into swap proposals. The tracker knows nothing
//! about pixels on screen beyond the thresholds in [`DragConfig`]; it only
//! decides which two tiles form the candidate pair and when the swap
//! commits or is cancelled.

use crate::board::Board;
use crate::config::DragConfig;
use crate::lines::Axis;
use crate::position::Direction;
use crate::tile::TileId;
use serde::{Deserialize, Serialize};

/// What the presentation layer should do after a pointer move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DragUpdate {
    /// Nothing to show yet (below threshold, or no swappable neighbour)
    Idle,
    /// Offset the opponent tile to follow the drag
    Shift { opponent: TileId, dx: f32, dy: f32 },
    /// The drag crossed the commit threshold; swap the pair
    Commit { initiator: TileId, opponent: TileId },
}

#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    tile: TileId,
    start: (f32, f32),
    axis: Option<Axis>,
    opponent: Option<TileId>,
}

/// Single-pointer drag state machine
#[derive(Debug, Clone)]
pub struct DragTracker {
    config: DragConfig,
    active: Option<ActiveDrag>,
}

impl DragTracker {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// The tile being dragged, if any
    pub fn dragged(&self) -> Option<TileId> {
        self.active.map(|drag| drag.tile)
    }

    /// The current candidate pair, if a direction has been chosen
    pub fn candidate(&self) -> Option<(TileId, TileId)> {
        let drag = self.active?;
        Some((drag.tile, drag.opponent?))
    }

    /// Start dragging `tile` from pointer position `(x, y)`.
    ///
    /// Ignored (returns `false`) while the board is resolving.
    pub fn press(&mut self, tile: TileId, x: f32, y: f32, in_progress: bool) -> bool {
        if in_progress {
            return false;
        }
        self.active = Some(ActiveDrag {
            tile,
            start: (x, y),
            axis: None,
            opponent: None,
        });
        true
    }

    /// Feed a pointer move
    pub fn drag(&mut self, board: &Board, x: f32, y: f32) -> DragUpdate {
        let Some(mut drag) = self.active else {
            return DragUpdate::Idle;
        };

        let dx = x - drag.start.0;
        let dy = y - drag.start.1;

        if drag.axis.is_none() {
            if dx.abs() > self.config.start_threshold {
                drag.axis = Some(Axis::Horizontal);
            } else if dy.abs() > self.config.start_threshold {
                drag.axis = Some(Axis::Vertical);
            }
        }

        let (direction, movement) = match drag.axis {
            None => (None, 0.0),
            Some(Axis::Horizontal) if dx < 0.0 => (Some(Direction::Left), dx),
            Some(Axis::Horizontal) if dx > 0.0 => (Some(Direction::Right), dx),
            Some(Axis::Vertical) if dy < 0.0 => (Some(Direction::Up), dy),
            Some(Axis::Vertical) if dy > 0.0 => (Some(Direction::Down), dy),
            Some(_) => (None, 0.0),
        };

        drag.opponent = direction
            .filter(|dir| board.available_directions(drag.tile).contains(dir))
            .and_then(|dir| board.neighbor_of(drag.tile, dir))
            .map(|tile| tile.id);
        self.active = Some(drag);

        let Some(opponent) = drag.opponent else {
            return DragUpdate::Idle;
        };

        if movement.abs() > self.config.tile_size * self.config.complete_ratio {
            self.active = None;
            return DragUpdate::Commit {
                initiator: drag.tile,
                opponent,
            };
        }

        match drag.axis {
            Some(Axis::Horizontal) => DragUpdate::Shift {
                opponent,
                dx: movement,
                dy: 0.0,
            },
            _ => DragUpdate::Shift {
                opponent,
                dx: 0.0,
                dy: movement,
            },
        }
    }

    /// Pointer released. Returns the pair to snap back when a candidate
    /// existed; the board is never touched.
    pub fn release(&mut self) -> Option<(TileId, TileId)> {
        let pair = self.candidate();
        self.active = None;
        pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn board(rows: &[&str]) -> Board {
        Board::from_rows(rows, 3, &mut StdRng::seed_from_u64(4)).unwrap()
    }

    fn id_at(board: &Board, row: usize, column: usize) -> TileId {
        board.cell_at(Position::new(row, column)).unwrap().unwrap().id
    }

    fn tracker() -> DragTracker {
        DragTracker::new(DragConfig::default())
    }

    #[test]
    fn test_press_blocked_while_in_progress() {
        let b = board(&["RG"]);
        let mut t = tracker();
        assert!(!t.press(id_at(&b, 0, 0), 0.0, 0.0, true));
        assert_eq!(t.dragged(), None);
    }

    #[test]
    fn test_below_start_threshold_is_idle() {
        let b = board(&["RG"]);
        let mut t = tracker();
        t.press(id_at(&b, 0, 0), 0.0, 0.0, false);
        assert_eq!(t.drag(&b, 20.0, 10.0), DragUpdate::Idle);
        assert_eq!(t.release(), None);
    }

    #[test]
    fn test_shift_then_commit() {
        let b = board(&["RG"]);
        let r = id_at(&b, 0, 0);
        let g = id_at(&b, 0, 1);
        let mut t = tracker();
        t.press(r, 0.0, 0.0, false);

        assert_eq!(
            t.drag(&b, 40.0, 5.0),
            DragUpdate::Shift {
                opponent: g,
                dx: 40.0,
                dy: 0.0
            }
        );
        assert_eq!(
            t.drag(&b, 60.0, 5.0),
            DragUpdate::Commit {
                initiator: r,
                opponent: g
            }
        );
        assert_eq!(t.dragged(), None);
    }

    #[test]
    fn test_axis_locks_once_chosen() {
        let b = board(&["RG", "PY"]);
        let r = id_at(&b, 0, 0);
        let mut t = tracker();
        t.press(r, 0.0, 0.0, false);

        assert!(matches!(t.drag(&b, 35.0, 0.0), DragUpdate::Shift { .. }));
        // Moving down afterwards does not switch to the vertical neighbour
        assert_eq!(t.drag(&b, 0.0, 45.0), DragUpdate::Idle);
    }

    #[test]
    fn test_same_kind_neighbor_never_offered() {
        let b = board(&["RR"]);
        let mut t = tracker();
        t.press(id_at(&b, 0, 0), 0.0, 0.0, false);
        assert_eq!(t.drag(&b, 80.0, 0.0), DragUpdate::Idle);
        assert_eq!(t.candidate(), None);
    }

    #[test]
    fn test_edge_direction_never_offered() {
        let b = board(&["RG"]);
        let mut t = tracker();
        t.press(id_at(&b, 0, 0), 0.0, 0.0, false);
        assert_eq!(t.drag(&b, -80.0, 0.0), DragUpdate::Idle);
    }

    #[test]
    fn test_release_before_threshold_cancels() {
        let b = board(&["R", "G"]);
        let r = id_at(&b, 0, 0);
        let g = id_at(&b, 1, 0);
        let mut t = tracker();
        t.press(r, 0.0, 0.0, false);

        assert!(matches!(t.drag(&b, 0.0, 31.0), DragUpdate::Shift { .. }));
        assert_eq!(t.release(), Some((r, g)));
        assert_eq!(t.release(), None);
        assert_eq!(b.position_of(r), Some(Position::new(0, 0)));
    }
}
