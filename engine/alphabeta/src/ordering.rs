//! Move ordering: transposition move, previous principal variation, killer
//! moves, history counters, then a static guess.

use engine_core::{Move, Placement, PatternLine, Position, MOVE_INDEX_SPACE};
use std::cmp::Reverse;

const TT_CLASS: u8 = 4;
const PV_CLASS: u8 = 3;
const KILLER_CLASS: u8 = 2;
const SECOND_KILLER_CLASS: u8 = 1;
const QUIET_CLASS: u8 = 0;

/// Killer and history tables. Lives for one search.
#[derive(Debug, Clone)]
pub struct MoveOrderer {
    killers: Vec<[Option<Move>; 2]>,
    history: Vec<u32>,
}

impl Default for MoveOrderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveOrderer {
    pub fn new() -> Self {
        Self {
            killers: Vec::new(),
            history: vec![0; MOVE_INDEX_SPACE],
        }
    }

    /// Sort `moves` best first. Ties keep generation order, so the result
    /// is deterministic.
    pub fn order(
        &self,
        pos: &Position,
        moves: &mut [Move],
        ply: usize,
        tt_move: Option<Move>,
        pv_move: Option<Move>,
    ) {
        let killers = self.killers.get(ply).copied().unwrap_or([None, None]);
        moves.sort_by_cached_key(|&mv| {
            let class = if Some(mv) == tt_move {
                TT_CLASS
            } else if Some(mv) == pv_move {
                PV_CLASS
            } else if Some(mv) == killers[0] {
                KILLER_CLASS
            } else if Some(mv) == killers[1] {
                SECOND_KILLER_CLASS
            } else {
                QUIET_CLASS
            };
            Reverse((class, self.history[mv.index()], static_priority(pos, mv)))
        });
    }

    /// Record a move that caused a cutoff at `ply` with `depth` plies left.
    pub fn record_cutoff(&mut self, mv: Move, ply: usize, depth: u32) {
        if self.killers.len() <= ply {
            self.killers.resize(ply + 1, [None, None]);
        }
        let slot = &mut self.killers[ply];
        if slot[0] != Some(mv) {
            slot[1] = slot[0];
            slot[0] = Some(mv);
        }
        let bonus = depth.saturating_mul(depth).max(1);
        let counter = &mut self.history[mv.index()];
        *counter = counter.saturating_add(bonus);
    }

    /// Halve history between iterations so recent depths dominate.
    pub fn age(&mut self) {
        for counter in &mut self.history {
            *counter /= 2;
        }
    }

    pub fn killers_at(&self, ply: usize) -> [Option<Move>; 2] {
        self.killers.get(ply).copied().unwrap_or([None, None])
    }

    pub fn history(&self, mv: Move) -> u32 {
        self.history[mv.index()]
    }
}

/// Cheap guess at move quality: completing a pattern line is good, tiles
/// spilling to the floor are bad.
pub fn static_priority(pos: &Position, mv: Move) -> i32 {
    let taken = pos
        .source_counts(mv.source)
        .map_or(0, |counts| counts.get(mv.color)) as i32;
    match mv.target {
        Placement::Row(row) => {
            let row = row as usize;
            let line = pos.board(pos.to_move()).line(row);
            let room = PatternLine::capacity(row) as i32 - line.count as i32;
            let placed = taken.min(room);
            let overflow = taken - placed;
            let completes = (taken >= room) as i32;
            completes * 8 + placed - overflow * 3
        }
        Placement::Floor => -3 * taken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::legal_moves;

    #[test]
    fn test_tt_move_then_pv_then_killers_first() {
        let pos = Position::new(2, 3).unwrap();
        let mut moves = legal_moves(&pos);
        let tt_move = moves[5];
        let pv_move = moves[9];
        let killer = moves[12];

        let mut orderer = MoveOrderer::new();
        orderer.record_cutoff(killer, 0, 2);
        orderer.order(&pos, &mut moves, 0, Some(tt_move), Some(pv_move));

        assert_eq!(moves[0], tt_move);
        assert_eq!(moves[1], pv_move);
        assert_eq!(moves[2], killer);
    }

    #[test]
    fn test_killers_shift_and_do_not_duplicate() {
        let pos = Position::new(2, 3).unwrap();
        let moves = legal_moves(&pos);
        let mut orderer = MoveOrderer::new();
        orderer.record_cutoff(moves[0], 3, 1);
        orderer.record_cutoff(moves[0], 3, 1);
        assert_eq!(orderer.killers_at(3), [Some(moves[0]), None]);
        orderer.record_cutoff(moves[1], 3, 1);
        assert_eq!(orderer.killers_at(3), [Some(moves[1]), Some(moves[0])]);
        assert_eq!(orderer.killers_at(7), [None, None]);
    }

    #[test]
    fn test_history_grows_and_ages() {
        let pos = Position::new(2, 3).unwrap();
        let mv = legal_moves(&pos)[0];
        let mut orderer = MoveOrderer::new();
        orderer.record_cutoff(mv, 0, 4);
        assert_eq!(orderer.history(mv), 16);
        orderer.age();
        assert_eq!(orderer.history(mv), 8);
    }

    #[test]
    fn test_ordering_is_deterministic() {
        let pos = Position::new(3, 11).unwrap();
        let orderer = MoveOrderer::new();
        let mut a = legal_moves(&pos);
        let mut b = legal_moves(&pos);
        b.reverse();
        orderer.order(&pos, &mut a, 0, None, None);
        orderer.order(&pos, &mut b, 0, None, None);
        // Equal keys keep input order, so only the key sequence must agree.
        let keys = |v: &[Move]| v.iter().map(|&m| static_priority(&pos, m)).collect::<Vec<_>>();
        assert_eq!(keys(&a), keys(&b));
        let mut again = legal_moves(&pos);
        orderer.order(&pos, &mut again, 0, None, None);
        assert_eq!(a, again);
    }

    #[test]
    fn test_floor_moves_rank_below_completions() {
        let pos = Position::new(2, 8).unwrap();
        for mv in legal_moves(&pos) {
            let taken = pos.source_counts(mv.source).unwrap().get(mv.color) as i32;
            if mv.is_floor() {
                assert_eq!(static_priority(&pos, mv), -3 * taken);
            } else if mv.target == Placement::Row(0) {
                // The one-tile line always completes.
                assert_eq!(static_priority(&pos, mv), 8 + 1 - 3 * (taken - 1));
            }
        }
    }
}
