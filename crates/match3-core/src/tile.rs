//! Tile identity and kinds.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::{Builder, Uuid};

/// The kinds of tile that can appear on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Green,
    Orange,
    Pink,
    Red,
    Yellow,
}

impl TileKind {
    /// All tile kinds
    pub const ALL: [TileKind; 5] = [
        TileKind::Green,
        TileKind::Orange,
        TileKind::Pink,
        TileKind::Red,
        TileKind::Yellow,
    ];

    /// Pick a kind uniformly at random
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Single-letter representation used by text boards
    pub fn to_char(&self) -> char {
        match self {
            TileKind::Green => 'G',
            TileKind::Orange => 'O',
            TileKind::Pink => 'P',
            TileKind::Red => 'R',
            TileKind::Yellow => 'Y',
        }
    }

    /// Parse the letter produced by [`TileKind::to_char`] (case-insensitive)
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'G' => Some(TileKind::Green),
            'O' => Some(TileKind::Orange),
            'P' => Some(TileKind::Pink),
            'R' => Some(TileKind::Red),
            'Y' => Some(TileKind::Yellow),
            _ => None,
        }
    }
}

/// Opaque tile identifier, stable for the lifetime of the tile.
///
/// Ids are random UUIDs, but the bytes come from the caller's generator so
/// a seeded engine hands out the same ids on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(Uuid);

impl TileId {
    /// Draw a fresh id from `rng`
    pub fn random(rng: &mut impl Rng) -> Self {
        Self(Builder::from_random_bytes(rng.gen()).into_uuid())
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for TileId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tile on the board. Its kind never changes after creation; swaps move
/// tiles between cells rather than relabelling them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
}

impl Tile {
    /// Create a tile of the given kind with a fresh id
    pub fn new(kind: TileKind, rng: &mut impl Rng) -> Self {
        Self {
            id: TileId::random(rng),
            kind,
        }
    }

    /// Create a tile of a random kind
    pub fn random(rng: &mut impl Rng) -> Self {
        let kind = TileKind::random(rng);
        Self::new(kind, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_char_round_trip() {
        for kind in TileKind::ALL {
            assert_eq!(TileKind::from_char(kind.to_char()), Some(kind));
        }
        assert_eq!(TileKind::from_char('r'), Some(TileKind::Red));
        assert_eq!(TileKind::from_char('.'), None);
    }

    #[test]
    fn test_ids_are_unique_and_seeded() {
        let mut rng = StdRng::seed_from_u64(7);
        let ids: HashSet<TileId> = (0..500).map(|_| TileId::random(&mut rng)).collect();
        assert_eq!(ids.len(), 500);

        let a = TileId::random(&mut StdRng::seed_from_u64(42));
        let b = TileId::random(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_kind_covers_all_kinds() {
        let mut rng = StdRng::seed_from_u64(1);
        let seen: HashSet<TileKind> = (0..200).map(|_| TileKind::random(&mut rng)).collect();
        assert_eq!(seen.len(), TileKind::ALL.len());
    }
}
