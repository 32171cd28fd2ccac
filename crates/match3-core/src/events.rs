//! Messages handed to the presentation layer.
//!
//! The engine never calls back into the presentation layer. Every phase
//! returns the events it produced, and the caller replays them (animating,
//! scoring, placing particle effects) at its own pace.

use crate::position::Position;
use crate::tile::{TileId, TileKind};
use serde::{Deserialize, Serialize};

/// Something that happened on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EngineEvent {
    /// A tile was consumed by a run; fade it out unless `prerun`
    TileDestroyed {
        tile: TileId,
        position: Position,
        prerun: bool,
    },

    /// A new tile filled an empty cell; drop it in unless `prerun`
    TileSpawned {
        tile: TileId,
        kind: TileKind,
        position: Position,
        prerun: bool,
    },

    /// A tile fell one or more cells
    TileMoved {
        tile: TileId,
        from: Position,
        to: Position,
        prerun: bool,
    },

    /// One destroy-group resolved
    Scored {
        count: u32,
        kind: TileKind,
        position: Position,
    },

    /// A resolve cycle started (`true`) or finished (`false`)
    Processing { active: bool },

    /// Two tiles traded places on the board
    SwapCommitted {
        initiator: TileId,
        opponent: TileId,
    },

    /// A committed swap formed no run and was undone
    SwapReverted {
        initiator: TileId,
        opponent: TileId,
    },

    /// A drag was released before the commit threshold; snap both tiles back
    SwapCancelled {
        initiator: TileId,
        opponent: TileId,
    },

    /// The session clock ran out
    TimeUp { score: u32, outcome: Outcome },
}

impl EngineEvent {
    /// The tile this event is about, if it concerns a single tile
    pub fn tile(&self) -> Option<TileId> {
        match self {
            EngineEvent::TileDestroyed { tile, .. }
            | EngineEvent::TileSpawned { tile, .. }
            | EngineEvent::TileMoved { tile, .. } => Some(*tile),
            _ => None,
        }
    }
}

/// How a timed session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Failed,
}
