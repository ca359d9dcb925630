//! Compound draft-and-place moves.
//!
//! A move names where tiles are drafted from, which colour is taken, and
//! where the drafted tiles are placed. Moves are plain values; the derived
//! `Ord` matches generation order and is the tie-break order of every search.

use crate::tile::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where tiles are drafted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DraftSource {
    Factory(u8),
    Center,
}

/// Where drafted tiles go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Placement {
    /// Pattern line index, 0 = the one-tile line.
    Row(u8),
    /// Every drafted tile goes to the floor line.
    Floor,
}

/// A complete move for the agent to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub source: DraftSource,
    pub color: Color,
    pub target: Placement,
}

const CENTER_CODE: u16 = 0xF;
const FLOOR_CODE: u16 = 0x7;
const VALID_BIT: u16 = 1 << 15;

/// Number of distinct packed move indices (see [`Move::index`]).
pub const MOVE_INDEX_SPACE: usize = 1 << 10;

impl Move {
    pub fn new(source: DraftSource, color: Color, target: Placement) -> Self {
        Self {
            source,
            color,
            target,
        }
    }

    /// Pack into 16 bits: source in bits 0-3, colour in 4-6, target in 7-9,
    /// bit 15 always set so that a packed move is never zero.
    pub fn pack(self) -> u16 {
        let source = match self.source {
            DraftSource::Factory(i) => i as u16 & 0xF,
            DraftSource::Center => CENTER_CODE,
        };
        let target = match self.target {
            Placement::Row(r) => r as u16 & 0x7,
            Placement::Floor => FLOOR_CODE,
        };
        VALID_BIT | source | ((self.color.index() as u16) << 4) | (target << 7)
    }

    pub fn unpack(bits: u16) -> Option<Move> {
        if bits & VALID_BIT == 0 {
            return None;
        }
        let source = match bits & 0xF {
            CENTER_CODE => DraftSource::Center,
            i => DraftSource::Factory(i as u8),
        };
        let color = Color::from_index(((bits >> 4) & 0x7) as usize)?;
        let target = match (bits >> 7) & 0x7 {
            FLOOR_CODE => Placement::Floor,
            r => Placement::Row(r as u8),
        };
        Some(Move::new(source, color, target))
    }

    /// Dense index in `0..MOVE_INDEX_SPACE`, used by history tables.
    #[inline]
    pub fn index(self) -> usize {
        (self.pack() & 0x3FF) as usize
    }

    /// True when every drafted tile lands on the floor.
    pub fn is_floor(self) -> bool {
        self.target == Placement::Floor
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            DraftSource::Factory(i) => write!(f, "F{}", i)?,
            DraftSource::Center => write!(f, "C")?,
        }
        write!(f, ":{}>", self.color)?;
        match self.target {
            Placement::Row(r) => write!(f, "{}", r + 1),
            Placement::Floor => write!(f, "floor"),
        }
    }
}
