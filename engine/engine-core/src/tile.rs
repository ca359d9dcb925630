//! Tile colours and per-colour tile counts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of distinct tile colours.
pub const NUM_COLORS: usize = 5;

/// Tiles of each colour in a full set.
pub const TILES_PER_COLOR: u8 = 20;

/// Total number of tiles in play. Conserved across every zone.
pub const TOTAL_TILES: usize = NUM_COLORS * TILES_PER_COLOR as usize;

/// A tile colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    Blue = 0,
    Yellow = 1,
    Red = 2,
    Black = 3,
    White = 4,
}

impl Color {
    pub const ALL: [Color; NUM_COLORS] = [
        Color::Blue,
        Color::Yellow,
        Color::Red,
        Color::Black,
        Color::White,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Color> {
        Self::ALL.get(index).copied()
    }

    /// Single-letter symbol used in move notation.
    pub fn symbol(self) -> char {
        match self {
            Color::Blue => 'B',
            Color::Yellow => 'Y',
            Color::Red => 'R',
            Color::Black => 'K',
            Color::White => 'W',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Number of tiles of each colour held by a zone (factory, centre, floor, discard).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TileCounts([u8; NUM_COLORS]);

impl TileCounts {
    pub const EMPTY: TileCounts = TileCounts([0; NUM_COLORS]);

    pub fn new(counts: [u8; NUM_COLORS]) -> Self {
        Self(counts)
    }

    /// Count the colours of a tile sequence.
    pub fn from_tiles(tiles: &[Color]) -> Self {
        let mut counts = Self::EMPTY;
        for &tile in tiles {
            counts.0[tile.index()] += 1;
        }
        counts
    }

    #[inline]
    pub fn get(&self, color: Color) -> u8 {
        self.0[color.index()]
    }

    #[inline]
    pub fn set(&mut self, color: Color, count: u8) {
        self.0[color.index()] = count;
    }

    #[inline]
    pub fn add(&mut self, color: Color, count: u8) {
        self.0[color.index()] += count;
    }

    /// Remove `count` tiles of `color`, or `None` if fewer are present.
    pub fn remove(&mut self, color: Color, count: u8) -> Option<()> {
        let slot = &mut self.0[color.index()];
        *slot = slot.checked_sub(count)?;
        Some(())
    }

    /// Remove and return every tile of `color`.
    pub fn take_all(&mut self, color: Color) -> u8 {
        std::mem::take(&mut self.0[color.index()])
    }

    pub fn merge(&mut self, other: &TileCounts) {
        for (slot, &n) in self.0.iter_mut().zip(other.0.iter()) {
            *slot += n;
        }
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.0.iter().map(|&n| n as usize).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&n| n == 0)
    }

    /// Colours with at least one tile, in ascending order.
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        Color::ALL.into_iter().filter(move |c| self.get(*c) > 0)
    }

    /// `(colour, count)` pairs for every colour, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (Color, u8)> + '_ {
        Color::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn as_array(&self) -> &[u8; NUM_COLORS] {
        &self.0
    }
}

impl fmt::Display for TileCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (color, n) in self.iter().filter(|(_, n)| *n > 0) {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}{}", n, color)?;
            first = false;
        }
        if first {
            write!(f, "-")?;
        }
        Ok(())
    }
}
