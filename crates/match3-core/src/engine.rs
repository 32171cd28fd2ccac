//! Resolution engine.
//!
//! Runs the destroy → gravity → refill cycle until the board is quiescent:
//!
//! ```text
//! Idle → Scanning → Destroying → Falling → Refilling ─┐
//!          ▲   │                    ▲                 │
//!          │   └── (gaps, no runs) ─┘                 │
//!          └───────────── something changed ──────────┘
//! ```
//!
//! Each phase runs synchronously inside [`Engine::step`] and reports the
//! events it produced plus the delay the presentation layer should wait
//! before the next phase reads the board. A "prerun" cycle is the same
//! algorithm with zero delays and no scoring, used to sanitize a freshly
//! filled board before play starts.

use crate::board::{Board, BoardError};
use crate::config::{GameConfig, PacingConfig, SwapPolicy};
use crate::events::EngineEvent;
use crate::lines::{self, Run};
use crate::moves::{self, SwapOutcome};
use crate::position::Position;
use crate::tile::TileId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Scans allowed per board cell before a cycle counts as stuck. Random
/// refills with a run length of 2 routinely need a few hundred scans on
/// larger boards.
const SCANS_PER_CELL: usize = 64;

/// Errors from the resolution engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("A resolve cycle is in progress")]
    InProgress,

    #[error("No resolve cycle is in progress")]
    NoCycle,

    #[error("Resolve cycle did not settle after {iterations} scans")]
    CycleDidNotConverge { iterations: usize },
}

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No cycle running; swaps are accepted
    Idle,
    /// Looking for runs
    Scanning,
    /// Removing the runs found by the last scan
    Destroying,
    /// Compacting columns
    Falling,
    /// Spawning tiles into empty cells
    Refilling,
}

/// Result of running one phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub events: Vec<EngineEvent>,
    /// Seconds to wait before the next phase (always 0 for prerun)
    pub delay: f32,
}

impl PhaseReport {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            events: Vec::new(),
            delay: 0.0,
        }
    }
}

/// Trace of a complete cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Resolution {
    pub reports: Vec<PhaseReport>,
    /// Distinct tiles destroyed during the cycle
    pub destroyed: usize,
    /// Number of scans performed
    pub iterations: usize,
}

impl Resolution {
    /// All events in the order they happened
    pub fn events(&self) -> impl Iterator<Item = &EngineEvent> + '_ {
        self.reports.iter().flat_map(|r| r.events.iter())
    }

    /// Sum of all `Scored` counts
    pub fn score(&self) -> u32 {
        self.events()
            .map(|e| match e {
                EngineEvent::Scored { count, .. } => *count,
                _ => 0,
            })
            .sum()
    }

    /// Whether nothing on the board changed
    pub fn is_quiet(&self) -> bool {
        !self.events().any(|e| {
            matches!(
                e,
                EngineEvent::TileDestroyed { .. }
                    | EngineEvent::TileMoved { .. }
                    | EngineEvent::TileSpawned { .. }
            )
        })
    }

    /// Total delay the presentation layer spends replaying this cycle
    pub fn total_delay(&self) -> f32 {
        self.reports.iter().map(|r| r.delay).sum()
    }
}

/// The board plus the cycle state machine
#[derive(Debug, Clone)]
pub struct Engine<R = StdRng> {
    board: Board,
    rng: R,
    pacing: PacingConfig,
    swap_policy: SwapPolicy,
    phase: Phase,
    /// Whether the open cycle is a prerun
    prerun: bool,
    /// Runs found by the last scan, consumed by Destroying
    pending: Vec<Run>,
    /// Whether anything changed since the last scan
    activity: bool,
    iterations: usize,
    destroyed: usize,
    max_iterations: usize,
}

impl Engine<StdRng> {
    /// Build an engine from configuration: fill the board at random and
    /// prerun it so play starts on a full board without matches.
    pub fn from_config(config: &GameConfig) -> Result<Self, EngineError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let board = Board::new(
            config.board.width,
            config.board.height,
            config.board.min_run_length,
        )?;

        let mut engine = Engine::new(board, rng)
            .with_pacing(config.pacing.clone())
            .with_swap_policy(config.swap_policy);
        engine.refill_and_prerun()?;
        Ok(engine)
    }
}

impl<R: Rng> Engine<R> {
    /// Wrap an existing board. The board is used as-is, no prerun happens.
    pub fn new(board: Board, rng: R) -> Self {
        let max_iterations = SCANS_PER_CELL * board.width() * board.height();
        Self {
            board,
            rng,
            pacing: PacingConfig::default(),
            swap_policy: SwapPolicy::default(),
            phase: Phase::Idle,
            prerun: false,
            pending: Vec::new(),
            activity: false,
            iterations: 0,
            destroyed: 0,
            max_iterations,
        }
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_swap_policy(mut self, policy: SwapPolicy) -> Self {
        self.swap_policy = policy;
        self
    }

    /// Override the number of scans one cycle may take
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn swap_policy(&self) -> SwapPolicy {
        self.swap_policy
    }

    /// Whether a cycle is running; input must not swap tiles meanwhile
    pub fn in_progress(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Fill every empty cell and prerun the board
    pub fn refill_and_prerun(&mut self) -> Result<Resolution, EngineError> {
        if self.in_progress() {
            return Err(EngineError::InProgress);
        }
        self.board.fill_random(&mut self.rng);
        self.prerun()
    }

    /// Run a silent cycle: no delays, no scoring
    pub fn prerun(&mut self) -> Result<Resolution, EngineError> {
        self.run_cycle(true)
    }

    /// Run a cycle from `Scanning` until the engine is `Idle` again
    pub fn run_cycle(&mut self, prerun: bool) -> Result<Resolution, EngineError> {
        let mut resolution = Resolution::default();
        resolution.reports.push(self.begin_cycle(prerun)?);

        while self.in_progress() {
            resolution.reports.push(self.step()?);
        }

        resolution.destroyed = self.destroyed;
        resolution.iterations = self.iterations;
        debug!(
            prerun,
            destroyed = resolution.destroyed,
            iterations = resolution.iterations,
            "Cycle settled"
        );
        Ok(resolution)
    }

    /// Open a cycle. The returned report carries the `Processing` start
    /// event for animated cycles.
    pub fn begin_cycle(&mut self, prerun: bool) -> Result<PhaseReport, EngineError> {
        if self.in_progress() {
            return Err(EngineError::InProgress);
        }

        self.phase = Phase::Scanning;
        self.prerun = prerun;
        self.pending.clear();
        self.activity = false;
        self.iterations = 0;
        self.destroyed = 0;

        let mut report = PhaseReport::new(Phase::Idle);
        if !prerun {
            report.events.push(EngineEvent::Processing { active: true });
        }
        Ok(report)
    }

    /// Run the current phase and advance the state machine
    pub fn step(&mut self) -> Result<PhaseReport, EngineError> {
        let report = match self.phase {
            Phase::Idle => return Err(EngineError::NoCycle),
            Phase::Scanning => self.scan()?,
            Phase::Destroying => self.destroy()?,
            Phase::Falling => self.fall()?,
            Phase::Refilling => self.refill()?,
        };

        debug!(
            phase = ?report.phase,
            events = report.events.len(),
            next = ?self.phase,
            "Phase finished"
        );
        for event in &report.events {
            trace!(?event);
        }
        Ok(report)
    }

    fn scan(&mut self) -> Result<PhaseReport, EngineError> {
        let mut report = PhaseReport::new(Phase::Scanning);

        self.iterations += 1;
        if self.iterations > self.max_iterations {
            warn!(iterations = self.iterations, "Resolve cycle did not converge");
            self.phase = Phase::Idle;
            return Err(EngineError::CycleDidNotConverge {
                iterations: self.max_iterations,
            });
        }

        self.activity = false;
        self.pending = lines::scan(&self.board);

        self.phase = if !self.pending.is_empty() {
            Phase::Destroying
        } else if !self.board.is_full() {
            Phase::Falling
        } else {
            self.finish(&mut report);
            Phase::Idle
        };

        Ok(report)
    }

    fn destroy(&mut self) -> Result<PhaseReport, EngineError> {
        let mut report = PhaseReport::new(Phase::Destroying);
        let prerun = self.prerun;
        let mut total = 0;

        for run in std::mem::take(&mut self.pending) {
            let mut count = 0u32;
            for (id, position) in &run.cells {
                // Crossing runs share tiles; the second visit finds them gone
                if self.board.position_of(*id) != Some(*position) {
                    continue;
                }
                if self.board.remove_at(*position)?.is_some() {
                    count += 1;
                    report.events.push(EngineEvent::TileDestroyed {
                        tile: *id,
                        position: *position,
                        prerun,
                    });
                }
            }

            if count > 0 && !prerun {
                report.events.push(EngineEvent::Scored {
                    count,
                    kind: run.kind,
                    position: run.center(),
                });
            }
            total += count as usize;
        }

        self.destroyed += total;
        if total > 0 {
            self.activity = true;
            report.delay = self.delay(self.pacing.destroy);
        }
        self.phase = Phase::Falling;
        Ok(report)
    }

    fn fall(&mut self) -> Result<PhaseReport, EngineError> {
        let mut report = PhaseReport::new(Phase::Falling);

        for column in 0..self.board.width() {
            // Bottom-up, so each tile drops onto an already-settled stack
            for row in (0..self.board.height()).rev() {
                let from = Position::new(row, column);
                let Some(id) = self.board.cell_at(from)?.map(|tile| tile.id) else {
                    continue;
                };

                while self.board.fall_one_step(id) {}

                let to = self.position(id)?;
                if to != from {
                    report.events.push(EngineEvent::TileMoved {
                        tile: id,
                        from,
                        to,
                        prerun: self.prerun,
                    });
                }
            }
        }

        if !report.events.is_empty() {
            self.activity = true;
            report.delay = self.delay(self.pacing.fall);
        }
        self.phase = Phase::Refilling;
        Ok(report)
    }

    fn refill(&mut self) -> Result<PhaseReport, EngineError> {
        let mut report = PhaseReport::new(Phase::Refilling);

        for position in self.board.empty_cells() {
            let tile = self.board.spawn_at(position, &mut self.rng)?;
            report.events.push(EngineEvent::TileSpawned {
                tile: tile.id,
                kind: tile.kind,
                position,
                prerun: self.prerun,
            });
        }

        if !report.events.is_empty() {
            self.activity = true;
            report.delay = self.delay(self.pacing.refill);
        }

        if self.activity {
            self.phase = Phase::Scanning;
        } else {
            self.finish(&mut report);
            self.phase = Phase::Idle;
        }
        Ok(report)
    }

    fn finish(&mut self, report: &mut PhaseReport) {
        if !self.prerun {
            report.events.push(EngineEvent::Processing { active: false });
        }
    }

    fn delay(&self, seconds: f32) -> f32 {
        if self.prerun {
            0.0
        } else {
            seconds
        }
    }

    fn position(&self, id: TileId) -> Result<Position, EngineError> {
        self.board
            .position_of(id)
            .ok_or(EngineError::Board(BoardError::UnknownTile(id)))
    }

    /// Exchange two adjacent tiles of different kinds without resolving
    pub fn swap(&mut self, initiator: TileId, opponent: TileId) -> Result<(), EngineError> {
        if self.in_progress() {
            return Err(EngineError::InProgress);
        }
        moves::validate_swap(&self.board, initiator, opponent)?;
        self.board.swap(initiator, opponent)?;
        Ok(())
    }

    /// Commit a completed drag: swap the tiles and resolve the board.
    ///
    /// Under [`SwapPolicy::RequireMatch`] a swap that forms no run is undone
    /// and no cycle runs.
    pub fn commit_swap(
        &mut self,
        initiator: TileId,
        opponent: TileId,
    ) -> Result<SwapOutcome, EngineError> {
        self.swap(initiator, opponent)?;

        if self.swap_policy == SwapPolicy::RequireMatch && !lines::has_runs(&self.board) {
            self.board.swap(initiator, opponent)?;
            debug!(%initiator, %opponent, "Swap formed no run, reverted");
            return Ok(SwapOutcome::Reverted {
                initiator,
                opponent,
            });
        }

        let resolution = self.run_cycle(false)?;
        Ok(SwapOutcome::Resolved {
            initiator,
            opponent,
            resolution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Direction;
    use pretty_assertions::assert_eq;

    fn engine(rows: &[&str]) -> Engine {
        let mut rng = StdRng::seed_from_u64(11);
        let board = Board::from_rows(rows, 3, &mut rng).unwrap();
        Engine::new(board, rng)
    }

    fn id_at(engine: &Engine, row: usize, column: usize) -> TileId {
        engine
            .board()
            .cell_at(Position::new(row, column))
            .unwrap()
            .unwrap()
            .id
    }

    #[test]
    fn test_step_walks_the_phases_in_order() {
        let mut e = engine(&["RRRG", "GOPY", "OPYG"]);
        e.begin_cycle(false).unwrap();

        let mut phases = Vec::new();
        while e.in_progress() {
            phases.push(e.step().unwrap().phase);
        }

        assert_eq!(
            &phases[..4],
            &[
                Phase::Scanning,
                Phase::Destroying,
                Phase::Falling,
                Phase::Refilling
            ]
        );
        assert_eq!(phases.last(), Some(&Phase::Scanning));
        assert_eq!(e.phase(), Phase::Idle);
    }

    #[test]
    fn test_step_without_cycle_fails() {
        let mut e = engine(&["RG"]);
        assert_eq!(e.step(), Err(EngineError::NoCycle));
    }

    #[test]
    fn test_swap_rejected_while_in_progress() {
        let mut e = engine(&["RRRG", "GOPY", "OPYG"]);
        let a = id_at(&e, 1, 0);
        let b = id_at(&e, 1, 1);

        e.begin_cycle(false).unwrap();
        assert_eq!(e.swap(a, b), Err(EngineError::InProgress));
        assert_eq!(e.begin_cycle(false).unwrap_err(), EngineError::InProgress);
    }

    #[test]
    fn test_destroy_deduplicates_crossing_tile() {
        let mut e = engine(&["GRG", "RRR", "GRG"]);
        e.begin_cycle(false).unwrap();
        e.step().unwrap(); // Scanning
        let report = e.step().unwrap();
        assert_eq!(report.phase, Phase::Destroying);

        let destroyed = report
            .events
            .iter()
            .filter(|ev| matches!(ev, EngineEvent::TileDestroyed { .. }))
            .count();
        assert_eq!(destroyed, 5);

        let scored: Vec<u32> = report
            .events
            .iter()
            .filter_map(|ev| match ev {
                EngineEvent::Scored { count, .. } => Some(*count),
                _ => None,
            })
            .collect();
        assert_eq!(scored, vec![3, 2]);
        assert_eq!(report.delay, 0.5);
    }

    #[test]
    fn test_falling_preserves_column_order() {
        let mut e = engine(&["RG", "O.", "P.", "..", "YR"]);
        let column_before = e.board().column_tiles(0);

        // Open a cycle and jump to gravity: the scan finds no runs but gaps
        e.begin_cycle(false).unwrap();
        e.step().unwrap();
        assert_eq!(e.phase(), Phase::Falling);
        let report = e.step().unwrap();

        assert_eq!(e.board().column_tiles(0), column_before);
        for column in 0..e.board().width() {
            assert!(e.board().column_is_compact(column));
        }
        assert_eq!(e.board().to_string(), "..\nR.\nO.\nPG\nYR");
        assert_eq!(report.events.len(), 4);
        assert!(report
            .events
            .iter()
            .all(|ev| matches!(ev, EngineEvent::TileMoved { .. })));
        assert_eq!(report.delay, 0.25);
    }

    #[test]
    fn test_prerun_is_silent_and_clean() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut board = Board::new(6, 6, 3).unwrap();
        board.fill_random(&mut rng);
        let mut e = Engine::new(board, rng);

        let resolution = e.prerun().unwrap();
        assert!(e.board().is_full());
        assert!(lines::scan(e.board()).is_empty());
        assert_eq!(resolution.total_delay(), 0.0);
        assert_eq!(resolution.score(), 0);
        assert!(resolution.events().all(|ev| match ev {
            EngineEvent::TileDestroyed { prerun, .. }
            | EngineEvent::TileSpawned { prerun, .. }
            | EngineEvent::TileMoved { prerun, .. } => *prerun,
            _ => false,
        }));
    }

    #[test]
    fn test_from_config_starts_stable() {
        let config = GameConfig {
            seed: Some(1234),
            ..GameConfig::default()
        };
        let e = Engine::from_config(&config).unwrap();
        assert!(e.board().is_full());
        assert!(!lines::has_runs(e.board()));
        assert_eq!(e.phase(), Phase::Idle);

        let again = Engine::from_config(&config).unwrap();
        assert_eq!(e.board().snapshot(), again.board().snapshot());
    }

    #[test]
    fn test_commit_swap_require_match_reverts() {
        let mut e = engine(&["RGO", "PYR"]).with_swap_policy(SwapPolicy::RequireMatch);
        let r = id_at(&e, 0, 0);
        let g = id_at(&e, 0, 1);

        let outcome = e.commit_swap(r, g).unwrap();
        assert!(matches!(outcome, SwapOutcome::Reverted { .. }));
        assert_eq!(e.board().to_string(), "RGO\nPYR");
    }

    #[test]
    fn test_commit_swap_rejects_same_kind_neighbor() {
        let mut e = engine(&["RRO", "PYG"]);
        let a = id_at(&e, 0, 0);
        let b = id_at(&e, 0, 1);
        assert!(!e.board().available_directions(a).contains(&Direction::Right));
        assert_eq!(
            e.commit_swap(a, b).unwrap_err(),
            EngineError::Board(BoardError::InvalidSwap)
        );
    }

    #[test]
    fn test_commit_swap_resolves_match() {
        let mut e = engine(&["RROR", "GPYG", "OYPO"]);
        let o = id_at(&e, 0, 2);
        let r = id_at(&e, 0, 3);

        let outcome = e.commit_swap(o, r).unwrap();
        let SwapOutcome::Resolved { resolution, .. } = outcome else {
            panic!("expected a resolved swap");
        };
        assert!(resolution.destroyed >= 3);
        assert!(resolution.score() >= 3);
        assert!(e.board().is_full());
        assert!(!lines::has_runs(e.board()));
        assert!(e.board().tile(r).is_none());
    }

    #[test]
    fn test_short_runs_settle_from_config() {
        for (width, height) in [(5, 5), (8, 8)] {
            for seed in 0..20 {
                let mut config = GameConfig {
                    seed: Some(seed),
                    ..GameConfig::default()
                };
                config.board.width = width;
                config.board.height = height;
                config.board.min_run_length = 2;
                config.validate().unwrap();
                let e = Engine::from_config(&config).unwrap();
                assert!(e.board().is_full());
                assert!(!lines::has_runs(e.board()));
            }
        }
    }

    #[test]
    fn test_cycle_that_keeps_matching_gives_up() {
        let mut e = engine(&["RRRG", "GOPY", "OPYG"]).with_max_iterations(1);

        assert_eq!(
            e.run_cycle(false).unwrap_err(),
            EngineError::CycleDidNotConverge { iterations: 1 }
        );
        assert_eq!(e.phase(), Phase::Idle);
        assert!(e.board().is_full());
    }
}
