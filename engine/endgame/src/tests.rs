//! Solver tests against a naive minimax.

use super::*;
use engine_core::heuristic::leaf_score;
use engine_core::{legal_moves, Move, Position, PositionParts, TileCounts};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::time::{Duration, Instant};

/// Random playout until fewer than `remaining` tiles are left to draft in
/// some round.
fn small_position(agents: usize, seed: u64, remaining: usize) -> Position {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut pos = Position::new(agents, seed).unwrap();
    loop {
        assert!(!pos.is_terminal(), "game ended before a small position");
        if pos.remaining_draftable() < remaining {
            return pos;
        }
        let moves = legal_moves(&pos);
        pos.play(*moves.choose(&mut rng).unwrap()).unwrap();
    }
}

/// Plain minimax with no memo and no canonicalization.
fn naive(pos: &Position, agent: usize) -> (Option<Move>, i32) {
    let maximize = pos.to_move() == agent;
    let mut best: Option<(Move, i32)> = None;
    for mv in legal_moves(pos) {
        let mut child = pos.clone();
        let undo = child.play(mv).unwrap();
        let value = if undo.crossed_round() || child.is_terminal() {
            leaf_score(&child, agent)
        } else {
            naive(&child, agent).1
        };
        let better = match best {
            None => true,
            Some((_, b)) => (maximize && value > b) || (!maximize && value < b),
        };
        if better {
            best = Some((mv, value));
        }
    }
    match best {
        Some((mv, v)) => (Some(mv), v),
        None => (None, leaf_score(pos, agent)),
    }
}

#[test]
fn test_solver_matches_naive_minimax() {
    for seed in 0..6 {
        let pos = small_position(2, seed, 6);
        for agent in 0..2 {
            let result = EndgameSolver::new().solve(&pos, agent).unwrap();
            let (mv, score) = naive(&pos, agent);
            assert_eq!(Some(result.best_move), mv, "seed {} agent {}", seed, agent);
            assert_eq!(result.score, score, "seed {} agent {}", seed, agent);
        }
    }
}

#[test]
fn test_three_agent_solve_matches_naive() {
    let pos = small_position(3, 17, 5);
    let result = EndgameSolver::new().solve(&pos, 2).unwrap();
    let (mv, score) = naive(&pos, 2);
    assert_eq!(Some(result.best_move), mv);
    assert_eq!(result.score, score);
}

#[test]
fn test_value_agrees_with_solve() {
    let pos = small_position(2, 3, 6);
    let mut solver = EndgameSolver::new();
    let solved = solver.solve(&pos, 0).unwrap();
    assert_eq!(solver.value(&pos, 0).unwrap(), solved.score);
}

#[test]
fn test_pv_is_playable_to_round_end() {
    let pos = small_position(2, 12, 6);
    let result = EndgameSolver::new().solve(&pos, 1).unwrap();
    assert_eq!(result.pv[0], result.best_move);

    let mut line = pos.clone();
    let mut crossed = false;
    for mv in &result.pv {
        assert!(!crossed, "pv continues past the round boundary");
        crossed = line.play(*mv).unwrap().crossed_round() || line.is_terminal();
    }
    assert!(crossed);
    assert_eq!(leaf_score(&line, 1), result.score);
}

#[test]
fn test_memo_is_reset_for_other_agent() {
    let pos = small_position(2, 21, 6);
    let mut solver = EndgameSolver::new();
    let for_zero = solver.solve(&pos, 0).unwrap().score;
    let for_one = solver.solve(&pos, 1).unwrap().score;
    assert_eq!(for_zero, naive(&pos, 0).1);
    assert_eq!(for_one, naive(&pos, 1).1);
}

#[test]
fn test_deadline_interrupts() {
    let pos = Position::new(2, 5).unwrap();
    let mut solver = EndgameSolver::new().with_deadline(Instant::now());
    let err = solver.solve(&pos, 0).unwrap_err();
    assert!(matches!(err, SolverError::Interrupted { .. }));
    assert!(!err.is_fatal());
}

#[test]
fn test_generous_deadline_does_not_interrupt() {
    let pos = small_position(2, 8, 5);
    let mut solver = EndgameSolver::new().with_deadline(Instant::now() + Duration::from_secs(60));
    assert!(solver.solve(&pos, 0).is_ok());
}

#[test]
fn test_applies_threshold() {
    let opening = Position::new(2, 1).unwrap();
    assert!(!applies(&opening, 6));
    assert!(applies(&opening, 100));
    let small = small_position(2, 1, 6);
    assert!(applies(&small, 6));
}

#[test]
fn test_bad_agent_is_rejected() {
    let pos = small_position(2, 2, 6);
    assert!(matches!(
        EndgameSolver::new().solve(&pos, 3),
        Err(SolverError::Engine(_))
    ));
}

#[test]
fn test_memo_limit_bounds_memory_without_changing_answers() {
    let mut parts = PositionParts::empty(2);
    parts.factories[0] = TileCounts::new([1, 1, 0, 0, 0]);
    parts.factories[1] = TileCounts::new([0, 0, 1, 1, 0]);
    let pos = Position::from_parts(parts.balance_discard()).unwrap();
    let mut solver = EndgameSolver::new().with_memo_limit(8);
    let result = solver.solve(&pos, 0).unwrap();
    let (mv, score) = naive(&pos, 0);
    assert_eq!(Some(result.best_move), mv);
    assert_eq!(result.score, score);
    assert!(solver.memo_len() <= 8);
    assert!(solver.memo_resets() > 0);
}

#[test]
fn test_deadline_is_honoured_on_large_positions() {
    let budget = Duration::from_millis(50);
    let pos = Position::new(4, 3).unwrap();
    let start = Instant::now();
    let mut solver = EndgameSolver::new().with_deadline(start + budget);
    let err = solver.solve(&pos, 0).unwrap_err();
    assert!(matches!(err, SolverError::Interrupted { .. }));
    assert!(
        start.elapsed() <= budget + Duration::from_millis(200),
        "solver overran its deadline: {:?}",
        start.elapsed()
    );
    assert!(solver.memo_len() <= MEMO_LIMIT);
}
