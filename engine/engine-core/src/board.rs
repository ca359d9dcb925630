//! Per-agent board: pattern lines, wall and floor line.
//!
//! # Wall Layout
//!
//! The wall has a fixed colour pattern; each row is the previous row
//! shifted right by one:
//! ```text
//! Row 0: B Y R K W
//! Row 1: W B Y R K
//! Row 2: K W B Y R
//! Row 3: R K W B Y
//! Row 4: Y R K W B
//! ```

use crate::tile::{Color, TileCounts, NUM_COLORS};
use serde::{Deserialize, Serialize};

/// Rows (and columns) of the wall; also the number of pattern lines.
pub const WALL_SIZE: usize = 5;

/// Slots in the floor line.
pub const FLOOR_SLOTS: usize = 7;

/// Score change for each occupied floor slot.
pub const FLOOR_PENALTIES: [i32; FLOOR_SLOTS] = [-1, -1, -2, -2, -2, -3, -3];

pub const ROW_BONUS: i32 = 2;
pub const COLUMN_BONUS: i32 = 7;
pub const COLOR_BONUS: i32 = 10;

const FULL_ROW: u8 = (1 << WALL_SIZE) - 1;

/// Wall column holding `color` in `row`.
#[inline]
pub fn wall_column(row: usize, color: Color) -> usize {
    (row + color.index()) % WALL_SIZE
}

/// Colour printed on wall cell `(row, col)`.
#[inline]
pub fn wall_color(row: usize, col: usize) -> Color {
    Color::ALL[(col + WALL_SIZE - row) % WALL_SIZE]
}

/// A staging row. `color` is `Some` exactly when `count > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PatternLine {
    pub color: Option<Color>,
    pub count: u8,
}

impl PatternLine {
    #[inline]
    pub fn capacity(row: usize) -> u8 {
        row as u8 + 1
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self, row: usize) -> bool {
        self.count == Self::capacity(row)
    }
}

/// Where drafted tiles ended up after a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlacementOutcome {
    pub to_line: u8,
    pub to_floor: u8,
    pub to_discard: u8,
}

/// One agent's board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlayerBoard {
    lines: [PatternLine; WALL_SIZE],
    /// Bit `col` of `wall[row]` is set when the cell is tiled.
    wall: [u8; WALL_SIZE],
    floor: TileCounts,
    has_token: bool,
    score: i32,
}

impl PlayerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: fill pattern line `row` with `count` tiles of `color`.
    pub fn with_line(mut self, row: usize, color: Color, count: u8) -> Self {
        self.lines[row] = if count == 0 {
            PatternLine::default()
        } else {
            PatternLine {
                color: Some(color),
                count,
            }
        };
        self
    }

    /// Builder: tile the wall cell for `color` in `row`.
    pub fn with_wall_tile(mut self, row: usize, color: Color) -> Self {
        self.wall[row] |= 1 << wall_column(row, color);
        self
    }

    /// Builder: put `count` tiles of `color` on the floor.
    pub fn with_floor(mut self, color: Color, count: u8) -> Self {
        self.floor.add(color, count);
        self
    }

    pub fn with_token(mut self, has_token: bool) -> Self {
        self.has_token = has_token;
        self
    }

    pub fn with_score(mut self, score: i32) -> Self {
        self.score = score;
        self
    }

    #[inline]
    pub fn line(&self, row: usize) -> PatternLine {
        self.lines[row]
    }

    pub fn lines(&self) -> &[PatternLine; WALL_SIZE] {
        &self.lines
    }

    #[inline]
    pub fn wall_row(&self, row: usize) -> u8 {
        self.wall[row]
    }

    #[inline]
    pub fn wall_has(&self, row: usize, col: usize) -> bool {
        self.wall[row] & (1 << col) != 0
    }

    #[inline]
    pub fn wall_row_has_color(&self, row: usize, color: Color) -> bool {
        self.wall_has(row, wall_column(row, color))
    }

    pub fn floor(&self) -> &TileCounts {
        &self.floor
    }

    pub fn has_token(&self) -> bool {
        self.has_token
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    /// Whether pattern line `row` can take tiles of `color`.
    #[inline]
    pub fn accepts(&self, row: usize, color: Color) -> bool {
        let line = self.lines[row];
        !line.is_full(row)
            && line.color.map_or(true, |c| c == color)
            && !self.wall_row_has_color(row, color)
    }

    /// Occupied floor slots, token included.
    pub fn floor_len(&self) -> usize {
        self.floor.total() + self.has_token as usize
    }

    /// Penalty the current floor would cost at round end (non-positive).
    pub fn floor_penalty(&self) -> i32 {
        FLOOR_PENALTIES[..self.floor_len().min(FLOOR_SLOTS)]
            .iter()
            .sum()
    }

    pub fn wall_tiles(&self) -> usize {
        self.wall.iter().map(|r| r.count_ones() as usize).sum()
    }

    /// Tiles physically on this board (lines, wall, floor).
    pub fn tile_count(&self) -> usize {
        let lines: usize = self.lines.iter().map(|l| l.count as usize).sum();
        lines + self.wall_tiles() + self.floor.total()
    }

    /// Tiles of each colour on this board.
    pub fn tiles_by_color(&self) -> TileCounts {
        let mut counts = self.floor;
        for line in &self.lines {
            if let Some(color) = line.color {
                counts.add(color, line.count);
            }
        }
        for row in 0..WALL_SIZE {
            for col in 0..WALL_SIZE {
                if self.wall_has(row, col) {
                    counts.add(wall_color(row, col), 1);
                }
            }
        }
        counts
    }

    /// Points scored by tiling `(row, col)` given the current wall.
    pub fn placement_points(&self, row: usize, col: usize) -> i32 {
        let mut horizontal = 1;
        let mut c = col;
        while c > 0 && self.wall_has(row, c - 1) {
            horizontal += 1;
            c -= 1;
        }
        let mut c = col + 1;
        while c < WALL_SIZE && self.wall_has(row, c) {
            horizontal += 1;
            c += 1;
        }

        let mut vertical = 1;
        let mut r = row;
        while r > 0 && self.wall_has(r - 1, col) {
            vertical += 1;
            r -= 1;
        }
        let mut r = row + 1;
        while r < WALL_SIZE && self.wall_has(r, col) {
            vertical += 1;
            r += 1;
        }

        match (horizontal > 1, vertical > 1) {
            (true, true) => horizontal + vertical,
            (true, false) => horizontal,
            (false, true) => vertical,
            (false, false) => 1,
        }
    }

    pub fn complete_rows(&self) -> usize {
        self.wall.iter().filter(|&&r| r == FULL_ROW).count()
    }

    pub fn complete_columns(&self) -> usize {
        (0..WALL_SIZE)
            .filter(|&col| (0..WALL_SIZE).all(|row| self.wall_has(row, col)))
            .count()
    }

    pub fn complete_colors(&self) -> usize {
        Color::ALL
            .iter()
            .filter(|&&color| (0..WALL_SIZE).all(|row| self.wall_row_has_color(row, color)))
            .count()
    }

    pub fn has_complete_row(&self) -> bool {
        self.wall.iter().any(|&r| r == FULL_ROW)
    }

    /// End-of-game bonus for the current wall.
    pub fn end_bonus(&self) -> i32 {
        self.complete_rows() as i32 * ROW_BONUS
            + self.complete_columns() as i32 * COLUMN_BONUS
            + self.complete_colors() as i32 * COLOR_BONUS
    }

    /// Tiled cells per colour, used by the heuristic.
    pub fn wall_color_counts(&self) -> [u8; NUM_COLORS] {
        let mut counts = [0u8; NUM_COLORS];
        for (row, counts_row) in (0..WALL_SIZE).map(|row| (row, self.wall[row])) {
            for col in 0..WALL_SIZE {
                if counts_row & (1 << col) != 0 {
                    counts[wall_color(row, col).index()] += 1;
                }
            }
        }
        counts
    }

    // ------------------------------------------------------------------
    // Mutation (crate-internal; the position keeps the hash in step)
    // ------------------------------------------------------------------

    pub(crate) fn take_token(&mut self) {
        self.has_token = true;
    }

    pub(crate) fn set_line(&mut self, row: usize, line: PatternLine) {
        self.lines[row] = line;
    }

    /// Put `count` tiles of `color` on the floor; tiles beyond the last slot
    /// are reported for the discard.
    pub(crate) fn add_to_floor(&mut self, color: Color, count: u8) -> PlacementOutcome {
        let space = FLOOR_SLOTS.saturating_sub(self.floor_len()) as u8;
        let to_floor = count.min(space);
        self.floor.add(color, to_floor);
        PlacementOutcome {
            to_line: 0,
            to_floor,
            to_discard: count - to_floor,
        }
    }

    /// Place drafted tiles into `row`, spilling the excess onto the floor.
    pub(crate) fn place_in_row(&mut self, row: usize, color: Color, count: u8) -> PlacementOutcome {
        let line = self.lines[row];
        let room = PatternLine::capacity(row) - line.count;
        let to_line = count.min(room);
        self.lines[row] = PatternLine {
            color: Some(color),
            count: line.count + to_line,
        };
        let spill = self.add_to_floor(color, count - to_line);
        PlacementOutcome {
            to_line,
            to_floor: spill.to_floor,
            to_discard: spill.to_discard,
        }
    }

    /// Tile full pattern lines and apply floor penalties.
    ///
    /// Returns the tiles headed for the discard and whether this board held
    /// the first-player token.
    pub(crate) fn tile_wall(&mut self) -> (TileCounts, bool) {
        let mut discard = TileCounts::EMPTY;
        for row in 0..WALL_SIZE {
            let line = self.lines[row];
            let Some(color) = line.color else { continue };
            if !line.is_full(row) {
                continue;
            }
            let col = wall_column(row, color);
            self.wall[row] |= 1 << col;
            self.score += self.placement_points(row, col);
            discard.add(color, line.count - 1);
            self.lines[row] = PatternLine::default();
        }

        self.score = (self.score + self.floor_penalty()).max(0);
        discard.merge(&self.floor);
        self.floor = TileCounts::EMPTY;
        let had_token = std::mem::take(&mut self.has_token);
        (discard, had_token)
    }

    pub(crate) fn apply_end_bonus(&mut self) {
        self.score += self.end_bonus();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_pattern() {
        assert_eq!(wall_color(0, 0), Color::Blue);
        assert_eq!(wall_color(1, 0), Color::White);
        assert_eq!(wall_color(4, 4), Color::Blue);
        for row in 0..WALL_SIZE {
            for color in Color::ALL {
                assert_eq!(wall_color(row, wall_column(row, color)), color);
            }
        }
    }

    #[test]
    fn test_accepts() {
        let board = PlayerBoard::new()
            .with_line(2, Color::Red, 2)
            .with_wall_tile(1, Color::Blue);
        assert!(board.accepts(2, Color::Red));
        assert!(!board.accepts(2, Color::Blue));
        assert!(!board.accepts(1, Color::Blue));
        assert!(board.accepts(1, Color::Red));

        let full = board.with_line(0, Color::Yellow, 1);
        assert!(!full.accepts(0, Color::Yellow));
    }

    #[test]
    fn test_place_in_row_spills_to_floor_and_discard() {
        let mut board = PlayerBoard::new().with_floor(Color::Black, 5);
        let outcome = board.place_in_row(1, Color::Red, 5);
        assert_eq!(outcome.to_line, 2);
        assert_eq!(outcome.to_floor, 2);
        assert_eq!(outcome.to_discard, 1);
        assert_eq!(board.floor_len(), FLOOR_SLOTS);
    }

    #[test]
    fn test_placement_points() {
        let board = PlayerBoard::new();
        assert_eq!(board.placement_points(2, 2), 1);

        // Horizontal neighbours only
        let board = PlayerBoard::new()
            .with_wall_tile(0, wall_color(0, 0))
            .with_wall_tile(0, wall_color(0, 1));
        assert_eq!(board.placement_points(0, 2), 3);

        // Horizontal and vertical neighbours
        let board = board.with_wall_tile(1, wall_color(1, 2));
        assert_eq!(board.placement_points(0, 2), 5);
    }

    #[test]
    fn test_floor_penalty_caps_at_slots() {
        let board = PlayerBoard::new().with_floor(Color::Blue, 2).with_token(true);
        assert_eq!(board.floor_penalty(), -4);
        let board = PlayerBoard::new().with_floor(Color::Blue, 7).with_token(true);
        assert_eq!(board.floor_penalty(), -14);
    }

    #[test]
    fn test_tile_wall_scores_and_clears() {
        let mut board = PlayerBoard::new()
            .with_line(0, Color::Blue, 1)
            .with_line(2, Color::Red, 3)
            .with_line(3, Color::White, 2)
            .with_floor(Color::Yellow, 1)
            .with_token(true)
            .with_score(1);

        let (discard, had_token) = board.tile_wall();
        assert!(had_token);
        // Two isolated tiles, minus two floor slots
        assert_eq!(board.score(), 1 + 1 + 1 - 2);
        assert_eq!(discard.get(Color::Red), 2);
        assert_eq!(discard.get(Color::Yellow), 1);
        assert!(board.line(0).is_empty());
        assert_eq!(board.line(3).count, 2);
        assert!(board.wall_row_has_color(2, Color::Red));
        assert_eq!(board.floor_len(), 0);
    }

    #[test]
    fn test_score_never_negative() {
        let mut board = PlayerBoard::new().with_floor(Color::Blue, 4);
        board.tile_wall();
        assert_eq!(board.score(), 0);
    }

    #[test]
    fn test_end_bonus() {
        let mut board = PlayerBoard::new();
        for color in Color::ALL {
            board = board.with_wall_tile(0, color);
        }
        for row in 0..WALL_SIZE {
            board = board.with_wall_tile(row, Color::Blue);
        }
        assert!(board.has_complete_row());
        assert_eq!(board.complete_colors(), 1);
        // Column 0 of row 0 is blue, but other blue cells sit on a diagonal
        assert_eq!(board.complete_columns(), 0);
        assert_eq!(board.end_bonus(), ROW_BONUS + COLOR_BONUS);
    }
}
