//! Static evaluation shared by every searcher.
//!
//! An agent's estimate is its realized score plus the points its board is
//! likely to bank (full pattern lines, partial lines weighted by how full
//! they are, wall rows/columns/colours close to their end bonus) plus the
//! floor penalty it is already exposed to. A position is worth the agent's
//! estimate minus the best opponent estimate. Fixed board size keeps this O(1).

use crate::board::{
    wall_column, PatternLine, PlayerBoard, COLOR_BONUS, COLUMN_BONUS, ROW_BONUS, WALL_SIZE,
};
use crate::position::Position;

/// Centipoints per game point.
pub const CENTI: i32 = 100;

const PARTIAL_LINE_WEIGHT: f64 = 0.5;
const PROXIMITY_WEIGHT: f64 = 0.5;

/// Scale used by [`value_to_unit`]: ten points of margin map to tanh(1).
const UNIT_SCALE: f64 = 1000.0;

/// Estimated final points for one board.
pub fn board_estimate(board: &PlayerBoard) -> f64 {
    let mut estimate = board.score() as f64;

    for row in 0..WALL_SIZE {
        let line = board.line(row);
        let Some(color) = line.color else { continue };
        let points = board.placement_points(row, wall_column(row, color)) as f64;
        if line.is_full(row) {
            estimate += points;
        } else {
            let fill = line.count as f64 / PatternLine::capacity(row) as f64;
            estimate += PARTIAL_LINE_WEIGHT * points * fill;
        }
    }

    let proximity = |tiled: u32, bonus: i32| {
        let ratio = tiled as f64 / WALL_SIZE as f64;
        ratio * ratio * PROXIMITY_WEIGHT * bonus as f64
    };
    for row in 0..WALL_SIZE {
        estimate += proximity(board.wall_row(row).count_ones(), ROW_BONUS);
    }
    for col in 0..WALL_SIZE {
        let tiled = (0..WALL_SIZE).filter(|&r| board.wall_has(r, col)).count() as u32;
        estimate += proximity(tiled, COLUMN_BONUS);
    }
    for count in board.wall_color_counts() {
        estimate += proximity(count as u32, COLOR_BONUS);
    }

    estimate + board.floor_penalty() as f64
}

/// Heuristic value of `pos` for `agent`, in game points.
///
/// Like every function here, `agent` must be in range for `pos`: callers
/// validate it once with [`Position::check_agent`] and this panics otherwise.
pub fn evaluate(pos: &Position, agent: usize) -> f64 {
    let own = board_estimate(pos.board(agent));
    let best_other = (0..pos.agents())
        .filter(|&a| a != agent)
        .map(|a| board_estimate(pos.board(a)))
        .fold(f64::NEG_INFINITY, f64::max);
    own - best_other
}

/// Realized margin of `agent` over the best opponent, in game points.
pub fn score_margin(pos: &Position, agent: usize) -> i32 {
    let best_other = (0..pos.agents())
        .filter(|&a| a != agent)
        .map(|a| pos.score(a))
        .max()
        .unwrap_or(0);
    pos.score(agent) - best_other
}

/// Leaf value in centipoints: the exact margin on finished games, the
/// rounded heuristic otherwise.
pub fn leaf_score(pos: &Position, agent: usize) -> i32 {
    if pos.is_terminal() {
        score_margin(pos, agent) * CENTI
    } else {
        (evaluate(pos, agent) * CENTI as f64).round() as i32
    }
}

/// Squash a centipoint score into `[-1, 1]`.
pub fn value_to_unit(score: i32) -> f32 {
    (score as f64 / UNIT_SCALE).tanh() as f32
}
