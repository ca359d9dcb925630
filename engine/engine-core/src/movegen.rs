//! Legal move generation.
//!
//! Moves are produced in a fixed order: factories ascending then the centre,
//! colours ascending within a source, pattern lines ascending. The floor is a
//! target only when no pattern line can take the colour, in which case it is
//! the single placement for that draft. The generated order equals the `Ord`
//! order of [`Move`].

use crate::board::WALL_SIZE;
use crate::moves::{DraftSource, Move, Placement};
use crate::position::Position;

/// Every legal move for the agent to act.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    generate_into(pos, &mut moves);
    moves
}

/// Legal moves for `agent`, empty unless that agent is to move.
pub fn legal_moves_for(pos: &Position, agent: usize) -> Vec<Move> {
    if agent != pos.to_move() {
        return Vec::new();
    }
    legal_moves(pos)
}

/// Generate into a caller-owned buffer, clearing it first.
pub fn generate_into(pos: &Position, moves: &mut Vec<Move>) {
    moves.clear();
    if pos.is_terminal() {
        return;
    }
    let board = pos.board(pos.to_move());

    let sources = (0..pos.factories().len())
        .map(|i| DraftSource::Factory(i as u8))
        .chain(std::iter::once(DraftSource::Center));

    for source in sources {
        let Some(counts) = pos.source_counts(source) else {
            continue;
        };
        for color in counts.colors() {
            let before = moves.len();
            for row in 0..WALL_SIZE {
                if board.accepts(row, color) {
                    moves.push(Move::new(source, color, Placement::Row(row as u8)));
                }
            }
            if moves.len() == before {
                moves.push(Move::new(source, color, Placement::Floor));
            }
        }
    }
}

/// Whether `mv` is in `legal_moves(pos)`.
pub fn is_legal(pos: &Position, mv: Move) -> bool {
    pos.check_move(mv).is_ok()
}

/// Number of legal moves without allocating them.
pub fn count_legal_moves(pos: &Position) -> usize {
    if pos.is_terminal() {
        return 0;
    }
    let board = pos.board(pos.to_move());
    let per_color = |color| {
        (0..WALL_SIZE)
            .filter(|&row| board.accepts(row, color))
            .count()
            .max(1)
    };
    pos.factories()
        .iter()
        .chain(std::iter::once(pos.center()))
        .map(|counts| counts.colors().map(per_color).sum::<usize>())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PlayerBoard;
    use crate::position::PositionParts;
    use crate::tile::{Color, TileCounts};

    #[test]
    fn test_opening_moves_are_sorted_and_unique() {
        let pos = Position::new(2, 7).unwrap();
        let moves = legal_moves(&pos);
        assert!(!moves.is_empty());
        assert!(moves.windows(2).all(|w| w[0] < w[1]));
        // Empty board: every colour fits every line, so no floor moves
        assert!(moves.iter().all(|m| !m.is_floor()));
        assert_eq!(moves.len(), count_legal_moves(&pos));
    }

    #[test]
    fn test_one_move_per_colour_per_row() {
        let mut parts = PositionParts::empty(2);
        parts.factories[0] = TileCounts::new([2, 0, 2, 0, 0]);
        let pos = Position::from_parts(parts.balance_discard()).unwrap();
        let moves = legal_moves(&pos);
        assert_eq!(moves.len(), 2 * WALL_SIZE);
        assert!(moves
            .iter()
            .all(|m| m.source == DraftSource::Factory(0)));
    }

    #[test]
    fn test_forced_floor_when_every_line_blocked() {
        let mut board = PlayerBoard::new();
        for row in 0..WALL_SIZE {
            board = board.with_wall_tile(row, Color::Blue);
        }
        let mut parts = PositionParts::empty(2);
        parts.factories[3] = TileCounts::new([3, 0, 0, 0, 0]);
        parts.boards[0] = board;
        let pos = Position::from_parts(parts.balance_discard()).unwrap();

        let moves = legal_moves(&pos);
        assert_eq!(
            moves,
            vec![Move::new(DraftSource::Factory(3), Color::Blue, Placement::Floor)]
        );
        assert!(is_legal(&pos, moves[0]));
        let row_move = Move::new(DraftSource::Factory(3), Color::Blue, Placement::Row(0));
        assert!(!is_legal(&pos, row_move));
    }

    #[test]
    fn test_legal_moves_for_other_agent_is_empty() {
        let pos = Position::new(3, 1).unwrap();
        assert!(legal_moves_for(&pos, 1).is_empty());
        assert_eq!(legal_moves_for(&pos, 0), legal_moves(&pos));
    }

    #[test]
    fn test_is_legal_agrees_with_generator() {
        let pos = Position::new(2, 99).unwrap();
        let legal = legal_moves(&pos);
        for source in (0..5u8).map(DraftSource::Factory).chain([DraftSource::Center]) {
            for color in Color::ALL {
                for target in (0..5u8).map(Placement::Row).chain([Placement::Floor]) {
                    let mv = Move::new(source, color, target);
                    assert_eq!(is_legal(&pos, mv), legal.contains(&mv), "{}", mv);
                }
            }
        }
    }
}
