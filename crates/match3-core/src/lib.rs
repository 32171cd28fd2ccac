//! Board resolution engine for a tile-matching ("match-3") puzzle game.
//!
//! This crate provides the game logic behind the board, including:
//! - Tile and grid model with positional queries
//! - Run detection along rows and columns
//! - The destroy → gravity → refill cycle, run until the board is stable
//! - Swap validation and drag gesture tracking
//! - A timed session with scoring
//!
//! # Architecture
//!
//! The engine is synchronous and deterministic for a given random source.
//! Rendering and animation live outside: every operation returns the events
//! it produced together with the pacing delay the presentation layer should
//! wait before the next phase. It can be compiled to:
//! - Native Rust (see the `match3` autoplayer binary)
//! - WebAssembly for a browser front end (`wasm` feature)
//!
//! # Modules
//!
//! - [`position`]: Grid coordinates and swap directions
//! - [`tile`]: Tile ids and kinds
//! - [`board`]: The grid container
//! - [`lines`]: Run detection
//! - [`engine`]: The resolve cycle state machine
//! - [`moves`]: Swap validation
//! - [`gesture`]: Drag tracking
//! - [`hint`]: Scoring move search
//! - [`session`]: Timed rounds

pub mod board;
pub mod config;
pub mod engine;
pub mod events;
pub mod gesture;
pub mod hint;
pub mod lines;
pub mod moves;
pub mod position;
pub mod session;
pub mod tile;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use board::{Board, BoardError, BoardSnapshot};
pub use config::{ConfigError, GameConfig, SwapPolicy};
pub use engine::{Engine, EngineError, Phase, PhaseReport, Resolution};
pub use events::{EngineEvent, Outcome};
pub use gesture::{DragTracker, DragUpdate};
pub use hint::{HintStrategy, Hinter, ScoringSwap};
pub use lines::{Axis, Run};
pub use moves::SwapOutcome;
pub use position::{Direction, Position};
pub use session::{GameSession, SessionAction, SessionError, SessionState};
pub use tile::{Tile, TileId, TileKind};
