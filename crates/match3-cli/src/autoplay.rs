//! Headless autoplayer.
//!
//! Plays one timed round: picks a swap with the hint search, drags it
//! through the gesture tracker, then replays the resolution phase by phase,
//! sleeping out each phase's delay the way an animated front end would.

use crate::settings::Settings;
use match3_core::{
    Direction, DragUpdate, EngineEvent, GameSession, HintStrategy, Hinter, Outcome, PhaseReport,
    SessionAction, SessionState, TileId,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Game seconds the player "thinks" between moves; the clock runs meanwhile
const THINK_SECS: f32 = 0.4;

pub struct Autoplayer {
    session: GameSession,
    hinter: Hinter,
    settings: Settings,
    moves: usize,
}

impl Autoplayer {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let session = GameSession::new(&settings.config)?;
        let hinter = match settings.config.seed {
            Some(seed) => Hinter::with_seed(HintStrategy::Greedy, seed),
            None => Hinter::new(HintStrategy::Greedy),
        };
        Ok(Self {
            session,
            hinter,
            settings,
            moves: 0,
        })
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    /// Play until the clock runs out
    pub async fn run(&mut self) -> anyhow::Result<Outcome> {
        let events = self.session.start()?;
        debug!(events = events.len(), "Board sanitized");
        info!("\n{}", self.session.board());

        loop {
            self.pause(THINK_SECS).await;
            let events = self
                .session
                .apply_action(SessionAction::Tick { seconds: THINK_SECS })?;
            self.emit(&events)?;

            if let SessionState::Finished { outcome } = self.session.state() {
                info!("\n{}", self.session.board());
                return Ok(outcome);
            }

            let Some((initiator, opponent)) = self.pick() else {
                warn!("No swap available");
                continue;
            };
            let Some((initiator, opponent)) = self.drag(initiator, opponent) else {
                warn!(%initiator, %opponent, "Drag did not commit");
                continue;
            };

            let reports = self.session.swap(initiator, opponent)?;
            self.moves += 1;
            self.replay(&reports).await?;
            self.session.apply_action(SessionAction::ReplayDone)?;
        }
    }

    /// Best scoring swap, or any legal one when nothing scores
    fn pick(&mut self) -> Option<(TileId, TileId)> {
        let board = self.session.board();
        match self.hinter.suggest(board) {
            Some(hint) => {
                debug!(
                    initiator = %hint.initiator,
                    direction = ?hint.direction,
                    clears = hint.clears,
                    "Hint"
                );
                Some((hint.initiator, hint.opponent))
            }
            None => self.hinter.any_available(board),
        }
    }

    /// Feed a synthetic pointer drag from `initiator` towards `opponent`
    fn drag(&mut self, initiator: TileId, opponent: TileId) -> Option<(TileId, TileId)> {
        let board = self.session.board();
        let direction = board
            .position_of(initiator)?
            .direction_to(&board.position_of(opponent)?)?;
        let (ux, uy) = match direction {
            Direction::Up => (0.0, -1.0),
            Direction::Right => (1.0, 0.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
        };
        let drag = &self.settings.config.drag;
        let lock = drag.start_threshold + 1.0;
        let full = drag.tile_size;

        if !self.session.press(initiator, 0.0, 0.0) {
            return None;
        }
        let mut update = self.session.drag(ux * lock, uy * lock);
        if let DragUpdate::Shift { .. } = update {
            update = self.session.drag(ux * full, uy * full);
        }

        match update {
            DragUpdate::Commit {
                initiator,
                opponent,
            } => Some((initiator, opponent)),
            _ => {
                self.session.apply_action(SessionAction::Release).ok();
                None
            }
        }
    }

    async fn replay(&self, reports: &[PhaseReport]) -> anyhow::Result<()> {
        for report in reports {
            self.emit(&report.events)?;
            self.pause(report.delay).await;
        }
        Ok(())
    }

    async fn pause(&self, seconds: f32) {
        if seconds > 0.0 {
            tokio::time::sleep(Duration::from_secs_f32(seconds / self.settings.time_scale)).await;
        }
    }

    fn emit(&self, events: &[EngineEvent]) -> anyhow::Result<()> {
        for event in events {
            if self.settings.json {
                println!("{}", serde_json::to_string(event)?);
                continue;
            }
            match event {
                EngineEvent::Scored {
                    count,
                    kind,
                    position,
                } => info!(count, ?kind, %position, total = self.session.score(), "Scored"),
                EngineEvent::TimeUp { score, outcome } => info!(score, ?outcome, "Time up"),
                other => debug!(event = ?other),
            }
        }
        Ok(())
    }
}
