//! Timed game session.
//!
//! Wraps the engine with the round rules: a countdown that pauses while the
//! board is resolving, a score fed by `Scored` events, and a win/fail
//! outcome when time runs out.

use crate::board::Board;
use crate::config::{DragConfig, GameConfig, SessionConfig};
use crate::engine::{Engine, EngineError, Phase, PhaseReport};
use crate::events::{EngineEvent, Outcome};
use crate::gesture::{DragTracker, DragUpdate};
use crate::moves::SwapOutcome;
use crate::tile::TileId;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors from session actions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Session has not started")]
    NotRunning,

    #[error("Session is over")]
    SessionOver,
}

/// Where the round is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Board ready, clock not started
    Ready,
    Running,
    Finished { outcome: Outcome },
}

/// Inputs the presentation layer feeds the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionAction {
    /// A drag crossed the commit threshold
    Swap { initiator: TileId, opponent: TileId },
    /// Wall-clock time passed
    Tick { seconds: f32 },
    /// Pointer released, or input forcibly released
    Release,
    /// Start a new round
    Restart,
    /// The presentation layer finished replaying the last swap's reports
    ReplayDone,
}

/// One timed round on one board
#[derive(Debug, Clone)]
pub struct GameSession<R = StdRng> {
    engine: Engine<R>,
    config: SessionConfig,
    drag: DragTracker,
    state: SessionState,
    score: u32,
    remaining: f32,
    /// Seconds of phase delays the presentation layer is still replaying
    replaying: f32,
}

impl GameSession<StdRng> {
    /// Create a session with a freshly filled, prerun board
    pub fn new(config: &GameConfig) -> Result<Self, SessionError> {
        let engine = Engine::from_config(config)?;
        Ok(Self::with_engine(
            engine,
            config.session.clone(),
            config.drag.clone(),
        ))
    }
}

impl<R: Rng> GameSession<R> {
    pub fn with_engine(engine: Engine<R>, config: SessionConfig, drag: DragConfig) -> Self {
        let remaining = config.duration_secs;
        Self {
            engine,
            config,
            drag: DragTracker::new(drag),
            state: SessionState::Ready,
            score: 0,
            remaining,
            replaying: 0.0,
        }
    }

    pub fn engine(&self) -> &Engine<R> {
        &self.engine
    }

    pub fn board(&self) -> &Board {
        self.engine.board()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Seconds left on the clock
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Whether the board is mid-resolution or its last cycle is still being
    /// replayed. Input should be blocked and the clock does not run.
    pub fn is_processing(&self) -> bool {
        self.engine.in_progress() || self.replaying > 0.0
    }

    /// Start (or restart) the round: sanitize the board, reset score and clock.
    ///
    /// Returns the prerun events so the presentation layer can sync its views.
    pub fn start(&mut self) -> Result<Vec<EngineEvent>, SessionError> {
        self.drag.release();
        let resolution = self.engine.refill_and_prerun()?;

        self.score = 0;
        self.remaining = self.config.duration_secs;
        self.replaying = 0.0;
        self.state = SessionState::Running;
        info!(duration = self.remaining, "Session started");

        Ok(resolution.events().cloned().collect())
    }

    /// Begin dragging a tile; ignored unless the round is running and idle
    pub fn press(&mut self, tile: TileId, x: f32, y: f32) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        let processing = self.is_processing();
        self.drag.press(tile, x, y, processing)
    }

    /// Feed a pointer move to the drag tracker
    pub fn drag(&mut self, x: f32, y: f32) -> DragUpdate {
        self.drag.drag(self.engine.board(), x, y)
    }

    /// Apply an input and return what happened
    pub fn apply_action(
        &mut self,
        action: SessionAction,
    ) -> Result<Vec<EngineEvent>, SessionError> {
        match action {
            SessionAction::Swap {
                initiator,
                opponent,
            } => Ok(self
                .swap(initiator, opponent)?
                .into_iter()
                .flat_map(|report| report.events)
                .collect()),
            SessionAction::Tick { seconds } => Ok(self.tick(seconds)),
            SessionAction::Release => Ok(self.release().into_iter().collect()),
            SessionAction::Restart => self.start(),
            SessionAction::ReplayDone => {
                self.replaying = 0.0;
                Ok(Vec::new())
            }
        }
    }

    /// Commit a swap and return the resolution phase by phase, so callers
    /// can wait out each report's delay before showing the next one.
    ///
    /// The session stays processing until the summed delays have been
    /// ticked away or [`SessionAction::ReplayDone`] arrives.
    pub fn swap(
        &mut self,
        initiator: TileId,
        opponent: TileId,
    ) -> Result<Vec<PhaseReport>, SessionError> {
        match self.state {
            SessionState::Ready => return Err(SessionError::NotRunning),
            SessionState::Finished { .. } => return Err(SessionError::SessionOver),
            SessionState::Running => {}
        }
        if self.is_processing() {
            return Err(SessionError::Engine(EngineError::InProgress));
        }

        let mut committed = PhaseReport {
            phase: Phase::Idle,
            events: vec![EngineEvent::SwapCommitted {
                initiator,
                opponent,
            }],
            delay: 0.0,
        };

        match self.engine.commit_swap(initiator, opponent)? {
            SwapOutcome::Resolved { resolution, .. } => {
                self.score += resolution.score();
                let mut reports = resolution.reports.into_iter();
                // The cycle's opening report only carries Processing; fold it in
                if let Some(opening) = reports.next() {
                    committed.events.extend(opening.events);
                }
                let reports: Vec<PhaseReport> =
                    std::iter::once(committed).chain(reports).collect();
                self.replaying = reports.iter().map(|r| r.delay).sum();
                Ok(reports)
            }
            SwapOutcome::Reverted { .. } => {
                committed.events.push(EngineEvent::SwapReverted {
                    initiator,
                    opponent,
                });
                Ok(vec![committed])
            }
        }
    }

    fn tick(&mut self, seconds: f32) -> Vec<EngineEvent> {
        if self.state != SessionState::Running || self.engine.in_progress() {
            return Vec::new();
        }

        // Replay time is spent first; the clock is paused meanwhile
        let mut seconds = seconds.max(0.0);
        let replayed = seconds.min(self.replaying);
        self.replaying -= replayed;
        seconds -= replayed;
        if seconds <= 0.0 {
            return Vec::new();
        }

        self.remaining = (self.remaining - seconds).max(0.0);
        if self.remaining > 0.0 {
            return Vec::new();
        }

        let mut events: Vec<EngineEvent> = self.release().into_iter().collect();
        let outcome = if self.score >= self.config.need_to_score {
            Outcome::Won
        } else {
            Outcome::Failed
        };
        self.state = SessionState::Finished { outcome };
        info!(score = self.score, ?outcome, "Time is up");

        events.push(EngineEvent::TimeUp {
            score: self.score,
            outcome,
        });
        events
    }

    /// Snap any dragged tile back; does not interrupt a running cycle
    fn release(&mut self) -> Option<EngineEvent> {
        self.drag
            .release()
            .map(|(initiator, opponent)| EngineEvent::SwapCancelled {
                initiator,
                opponent,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use rand::SeedableRng;

    fn session(rows: &[&str]) -> GameSession {
        let mut rng = StdRng::seed_from_u64(17);
        let board = Board::from_rows(rows, 3, &mut rng).unwrap();
        GameSession::with_engine(
            Engine::new(board, rng),
            SessionConfig::default(),
            DragConfig::default(),
        )
    }

    fn id_at(session: &GameSession, row: usize, column: usize) -> TileId {
        session
            .board()
            .cell_at(Position::new(row, column))
            .unwrap()
            .unwrap()
            .id
    }

    #[test]
    fn test_swap_before_start_fails() {
        let mut s = session(&["RROR", "GPYG", "OYPO"]);
        let action = SessionAction::Swap {
            initiator: id_at(&s, 0, 2),
            opponent: id_at(&s, 0, 3),
        };
        assert_eq!(s.apply_action(action), Err(SessionError::NotRunning));
    }

    #[test]
    fn test_scoring_swap_adds_score() {
        let mut s = session(&["RROR", "GPYG", "OYPO"]);
        s.start().unwrap();
        let (o, r) = (id_at(&s, 0, 2), id_at(&s, 0, 3));

        let events = s
            .apply_action(SessionAction::Swap {
                initiator: o,
                opponent: r,
            })
            .unwrap();

        assert_eq!(
            events.first(),
            Some(&EngineEvent::SwapCommitted {
                initiator: o,
                opponent: r
            })
        );
        assert!(s.score() >= 3);
        assert_eq!(events.last(), Some(&EngineEvent::Processing { active: false }));
    }

    #[test]
    fn test_swap_reports_carry_pacing() {
        let mut s = session(&["RROR", "GPYG", "OYPO"]);
        s.start().unwrap();
        let (o, r) = (id_at(&s, 0, 2), id_at(&s, 0, 3));

        let reports = s.swap(o, r).unwrap();

        assert_eq!(
            reports[0].events[..2],
            [
                EngineEvent::SwapCommitted {
                    initiator: o,
                    opponent: r
                },
                EngineEvent::Processing { active: true }
            ]
        );
        assert_eq!(reports[0].delay, 0.0);
        assert_eq!(reports[1].phase, Phase::Scanning);
        assert_eq!(reports[2].phase, Phase::Destroying);
        assert_eq!(reports[2].delay, 0.5);
        assert!(s.is_processing());
    }

    #[test]
    fn test_clock_runs_out() {
        let mut s = session(&["RG", "PY"]);
        s.start().unwrap();

        assert!(s.apply_action(SessionAction::Tick { seconds: 4.0 }).unwrap().is_empty());
        assert_eq!(s.remaining(), 6.0);

        let events = s.apply_action(SessionAction::Tick { seconds: 7.0 }).unwrap();
        assert_eq!(
            events,
            vec![EngineEvent::TimeUp {
                score: 0,
                outcome: Outcome::Failed
            }]
        );
        assert_eq!(
            s.state(),
            SessionState::Finished {
                outcome: Outcome::Failed
            }
        );

        let (a, b) = (id_at(&s, 0, 0), id_at(&s, 0, 1));
        assert_eq!(
            s.apply_action(SessionAction::Swap {
                initiator: a,
                opponent: b
            }),
            Err(SessionError::SessionOver)
        );
    }

    #[test]
    fn test_time_up_releases_drag() {
        let mut s = session(&["RG", "PY"]);
        s.start().unwrap();
        let (r, g) = (id_at(&s, 0, 0), id_at(&s, 0, 1));

        assert!(s.press(r, 0.0, 0.0));
        assert!(matches!(s.drag(35.0, 0.0), DragUpdate::Shift { .. }));

        let events = s.apply_action(SessionAction::Tick { seconds: 10.0 }).unwrap();
        assert_eq!(
            events[0],
            EngineEvent::SwapCancelled {
                initiator: r,
                opponent: g
            }
        );
        assert!(matches!(events[1], EngineEvent::TimeUp { .. }));
        assert_eq!(s.board().position_of(r), Some(Position::new(0, 0)));
    }

    #[test]
    fn test_restart_resets_round() {
        let mut s = session(&["RROR", "GPYG", "OYPO"]);
        s.start().unwrap();
        let (o, r) = (id_at(&s, 0, 2), id_at(&s, 0, 3));
        s.apply_action(SessionAction::Swap {
            initiator: o,
            opponent: r,
        })
        .unwrap();
        s.apply_action(SessionAction::Tick { seconds: 3.0 }).unwrap();

        s.apply_action(SessionAction::Restart).unwrap();
        assert_eq!(s.score(), 0);
        assert_eq!(s.remaining(), 10.0);
        assert_eq!(s.state(), SessionState::Running);
    }

    #[test]
    fn test_new_from_config() {
        let config = GameConfig {
            seed: Some(9),
            ..GameConfig::default()
        };
        let s = GameSession::new(&config).unwrap();
        assert_eq!(s.state(), SessionState::Ready);
        assert!(s.board().is_full());
    }

    #[test]
    fn test_clock_paused_while_replaying() {
        let mut s = session(&["RROR", "GPYG", "OYPO"]);
        s.start().unwrap();
        let (o, r) = (id_at(&s, 0, 2), id_at(&s, 0, 3));

        let reports = s.swap(o, r).unwrap();
        let replay: f32 = reports.iter().map(|r| r.delay).sum();
        assert!(replay > 0.0);
        assert!(s.is_processing());
        assert!(!s.press(id_at(&s, 1, 0), 0.0, 0.0));

        s.apply_action(SessionAction::Tick { seconds: replay }).unwrap();
        assert_eq!(s.remaining(), 10.0);
        assert!(!s.is_processing());

        s.apply_action(SessionAction::Tick { seconds: 1.0 }).unwrap();
        assert_eq!(s.remaining(), 9.0);
    }

    #[test]
    fn test_tick_spills_over_replay() {
        let mut s = session(&["RROR", "GPYG", "OYPO"]);
        s.start().unwrap();
        let (o, r) = (id_at(&s, 0, 2), id_at(&s, 0, 3));

        let replay: f32 = s.swap(o, r).unwrap().iter().map(|r| r.delay).sum();
        s.apply_action(SessionAction::Tick {
            seconds: replay + 2.0,
        })
        .unwrap();

        assert!(!s.is_processing());
        assert!((s.remaining() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_swap_blocked_until_replay_done() {
        let mut s = session(&["RROR", "GPYG", "OYPO"]);
        s.start().unwrap();
        let (o, r) = (id_at(&s, 0, 2), id_at(&s, 0, 3));
        s.swap(o, r).unwrap();

        let (a, b) = (id_at(&s, 1, 0), id_at(&s, 1, 1));
        assert_eq!(
            s.swap(a, b),
            Err(SessionError::Engine(EngineError::InProgress))
        );

        assert!(s.apply_action(SessionAction::ReplayDone).unwrap().is_empty());
        assert!(!s.is_processing());
        assert!(s.press(a, 0.0, 0.0));
    }
}
