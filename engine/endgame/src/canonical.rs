//! Symmetry canonicalization for solver memo keys.
//!
//! Factories are interchangeable: permuting them changes which move names a
//! draft but never the value of the position. The canonical form sorts them,
//! so every permutation maps to one representative. Equality is full
//! structural equality; the Zobrist key is never trusted on its own here.
//!
//! A fingerprint of the fields is computed once on construction and is all
//! that [`Hash`] feeds the hasher, so growing a large memo never rehashes
//! the boards.
//!
//! The supply and bag seed are left out. Keys are only compared within one
//! solve, and no position below the root of a solve changes either of them
//! before the round boundary where the search stops.

use engine_core::{PlayerBoard, Position, TileCounts};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPosition {
    fingerprint: u64,
    factories: Vec<TileCounts>,
    center: TileCounts,
    token_in_center: bool,
    boards: Vec<PlayerBoard>,
    discard: TileCounts,
    to_move: u8,
    starter: u8,
    round: u16,
}

impl CanonicalPosition {
    pub fn new(pos: &Position) -> Self {
        let mut factories: Vec<TileCounts> = pos
            .factories()
            .iter()
            .filter(|f| !f.is_empty())
            .copied()
            .collect();
        factories.sort_unstable();
        let mut key = Self {
            fingerprint: 0,
            factories,
            center: *pos.center(),
            token_in_center: pos.token_in_center(),
            boards: pos.boards().to_vec(),
            discard: *pos.discard(),
            to_move: pos.to_move() as u8,
            starter: pos.starter() as u8,
            round: pos.round(),
        };
        key.fingerprint = key.compute_fingerprint();
        key
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    fn compute_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.factories.hash(&mut hasher);
        self.center.hash(&mut hasher);
        self.token_in_center.hash(&mut hasher);
        self.boards.hash(&mut hasher);
        self.discard.hash(&mut hasher);
        (self.to_move, self.starter, self.round).hash(&mut hasher);
        hasher.finish()
    }
}

impl Hash for CanonicalPosition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fingerprint);
    }
}

impl From<&Position> for CanonicalPosition {
    fn from(pos: &Position) -> Self {
        Self::new(pos)
    }
}
