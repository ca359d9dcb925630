//! Exhaustive minimax to the end of the current round.
//!
//! Every line is followed until the round closes (or the game ends), where
//! the position is scored with the shared leaf function. Values are
//! centipoints from the solving agent's perspective: that agent maximizes,
//! every other agent minimizes. Subtrees are memoised on
//! [`CanonicalPosition`], so transpositions and factory permutations are
//! searched once. The memo holds at most [`MEMO_LIMIT`] entries by
//! default and is emptied, keeping its allocation, when it fills up.
//!
//! The deadline is checked at every node and between root moves.

use crate::canonical::CanonicalPosition;
use engine_core::{heuristic::leaf_score, legal_moves, EngineError, Move, Position};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Default memo capacity in entries.
pub const MEMO_LIMIT: usize = 1 << 17;

#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The deadline passed before the solve finished. No partial value is
    /// reported.
    #[error("Endgame solve interrupted after {nodes} nodes")]
    Interrupted { nodes: u64 },

    #[error("No legal moves to solve")]
    NoLegalMoves,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl SolverError {
    /// True when the error means the position itself is broken.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SolverError::Engine(e) if e.is_fatal())
    }
}

/// Outcome of [`EndgameSolver::solve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveResult {
    pub best_move: Move,
    /// Exact value in centipoints for the solving agent.
    pub score: i32,
    /// Best line to the round boundary, starting with `best_move`.
    pub pv: Vec<Move>,
    pub nodes: u64,
}

/// Whether `pos` is small enough for the solver.
pub fn applies(pos: &Position, threshold: usize) -> bool {
    !pos.is_terminal() && pos.remaining_draftable() < threshold
}

/// Memoised solver. The memo is tied to one solving agent and is cleared
/// when asked about another.
#[derive(Debug)]
pub struct EndgameSolver {
    memo: HashMap<CanonicalPosition, i32>,
    memo_limit: usize,
    memo_agent: Option<usize>,
    deadline: Option<Instant>,
    nodes: u64,
    memo_hits: u64,
    memo_resets: u64,
}

impl Default for EndgameSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EndgameSolver {
    pub fn new() -> Self {
        Self {
            memo: HashMap::new(),
            memo_limit: MEMO_LIMIT,
            memo_agent: None,
            deadline: None,
            nodes: 0,
            memo_hits: 0,
            memo_resets: 0,
        }
    }

    /// Cap the memo at `limit` entries (at least one).
    pub fn with_memo_limit(mut self, limit: usize) -> Self {
        self.memo_limit = limit.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn memo_hits(&self) -> u64 {
        self.memo_hits
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Times the memo was emptied for reaching its limit.
    pub fn memo_resets(&self) -> u64 {
        self.memo_resets
    }

    /// Best move, exact value and principal variation for `agent`.
    ///
    /// Among equally valued moves the smallest [`Move`] wins.
    pub fn solve(&mut self, pos: &Position, agent: usize) -> Result<SolveResult, SolverError> {
        pos.check_agent(agent)?;
        self.prepare(agent);
        let start_nodes = self.nodes;
        let mut work = pos.clone();

        let (best_move, score) = self
            .best_child(&mut work, agent)?
            .ok_or(SolverError::NoLegalMoves)?;

        let mut pv = vec![best_move];
        let mut undo = work.play(best_move)?;
        while !undo.crossed_round() && !work.is_terminal() {
            match self.best_child(&mut work, agent)? {
                Some((mv, _)) => {
                    pv.push(mv);
                    undo = work.play(mv)?;
                }
                None => break,
            }
        }

        let nodes = self.nodes - start_nodes;
        debug!(
            "Endgame solved: move={} score={} pv_len={} nodes={} memo={}",
            best_move,
            score,
            pv.len(),
            nodes,
            self.memo.len()
        );
        Ok(SolveResult {
            best_move,
            score,
            pv,
            nodes,
        })
    }

    /// Exact value of `pos` for `agent`.
    pub fn value(&mut self, pos: &Position, agent: usize) -> Result<i32, SolverError> {
        pos.check_agent(agent)?;
        self.prepare(agent);
        let mut work = pos.clone();
        self.minimax(&mut work, agent)
    }

    fn prepare(&mut self, agent: usize) {
        if self.memo_agent != Some(agent) {
            self.memo.clear();
            self.memo_agent = Some(agent);
        }
    }

    /// Best move from `pos` for whoever is to move, with its value.
    fn best_child(
        &mut self,
        pos: &mut Position,
        agent: usize,
    ) -> Result<Option<(Move, i32)>, SolverError> {
        let maximize = pos.to_move() == agent;
        let mut best: Option<(Move, i32)> = None;
        for mv in legal_moves(pos) {
            self.check_deadline()?;
            let value = self.child_value(pos, mv, agent)?;
            // Moves arrive in ascending order, so strict improvement keeps the
            // smallest move among ties.
            let better = match best {
                None => true,
                Some((_, b)) if maximize => value > b,
                Some((_, b)) => value < b,
            };
            if better {
                best = Some((mv, value));
            }
        }
        Ok(best)
    }

    fn child_value(&mut self, pos: &mut Position, mv: Move, agent: usize) -> Result<i32, SolverError> {
        let undo = pos.play(mv)?;
        let value = if undo.crossed_round() || pos.is_terminal() {
            Ok(leaf_score(pos, agent))
        } else {
            self.minimax(pos, agent)
        };
        pos.undo(undo);
        value
    }

    fn check_deadline(&self) -> Result<(), SolverError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(SolverError::Interrupted { nodes: self.nodes })
            }
            _ => Ok(()),
        }
    }

    fn remember(&mut self, key: CanonicalPosition, value: i32) {
        if self.memo.len() >= self.memo_limit {
            self.memo.clear();
            self.memo_resets += 1;
        }
        self.memo.insert(key, value);
    }

    fn minimax(&mut self, pos: &mut Position, agent: usize) -> Result<i32, SolverError> {
        self.nodes += 1;
        self.check_deadline()?;

        if pos.is_terminal() {
            return Ok(leaf_score(pos, agent));
        }

        let key = CanonicalPosition::new(pos);
        if let Some(&value) = self.memo.get(&key) {
            self.memo_hits += 1;
            return Ok(value);
        }

        let maximize = pos.to_move() == agent;
        let mut best = if maximize { i32::MIN } else { i32::MAX };
        let moves = legal_moves(pos);
        if moves.is_empty() {
            return Err(EngineError::StateInvariantViolation(
                "non-terminal position without legal moves".into(),
            )
            .into());
        }
        for mv in moves {
            let value = self.child_value(pos, mv, agent)?;
            best = if maximize { best.max(value) } else { best.min(value) };
        }

        self.remember(key, best);
        Ok(best)
    }
}
