//! Iterative-deepening paranoid alpha-beta.
//!
//! The searching agent maximizes and every other agent is assumed to
//! minimize the searching agent's margin. Each iteration searches a fresh
//! clone of the root, so an iteration cut short by the deadline is simply
//! discarded and the last completed depth stands.

use crate::config::AlphaBetaConfig;
use crate::ordering::MoveOrderer;
use crate::tt::{Bound, TranspositionCache, TranspositionTable, TtEntry, EXACT_DEPTH};
use endgame::{applies, EndgameSolver, SolverError};
use engine_core::heuristic::leaf_score;
use engine_core::zobrist::KEYS;
use engine_core::{is_legal, legal_moves, Completion, EngineError, Move, Position};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Larger than any leaf score.
const INF: i32 = 1_000_000_000;

/// Mixed into cache keys of searches that stop at the round boundary, so
/// both horizons can share one cache.
const ROUND_HORIZON_SALT: u64 = 0x5DEE_CE66_D1CE_4E5B;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Agent {agent} is not to move (agent {to_move} is)")]
    NotToMove { agent: usize, to_move: usize },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Counters collected during one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub tt_hits: u64,
    pub tt_cutoffs: u64,
    pub solver_calls: u64,
    pub completed_depth: u32,
    pub elapsed: Duration,
}

/// Result of an exact-mode search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Move,
    /// Expected line from the root, starting with `best_move`. May be cut
    /// short where a line was resolved from the cache or the solver.
    pub principal_variation: Vec<Move>,
    /// Centipoints for the searching agent.
    pub score: i32,
    /// Deepest completed iteration.
    pub depth: u32,
    /// No line was cut by the depth limit, so deeper search cannot change
    /// the score.
    pub exact: bool,
    pub completion: Completion,
    pub stats: SearchStats,
}

/// Why a subtree search stopped without a value.
enum Stop {
    Deadline,
    Failed(SearchError),
}

impl From<EngineError> for Stop {
    fn from(e: EngineError) -> Self {
        Stop::Failed(e.into())
    }
}

impl From<SolverError> for Stop {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Interrupted { .. } => Stop::Deadline,
            SolverError::NoLegalMoves => Stop::Failed(SearchError::NoLegalMoves),
            SolverError::Engine(e) => Stop::Failed(e.into()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Eval {
    score: i32,
    /// Some line below was cut by the depth limit.
    limited: bool,
}

struct RootOutcome {
    best_move: Move,
    score: i32,
    pv: Vec<Move>,
    limited: bool,
}

/// One exact-mode search for one agent.
pub struct AlphaBetaSearch<'a> {
    config: &'a AlphaBetaConfig,
    cache: &'a dyn TranspositionCache,
    agent: usize,
    salt: u64,
    deadline: Option<Instant>,
    orderer: MoveOrderer,
    solver: EndgameSolver,
    pv: Vec<Vec<Move>>,
    prev_pv: Vec<Move>,
    stats: SearchStats,
}

impl<'a> AlphaBetaSearch<'a> {
    pub fn new(config: &'a AlphaBetaConfig, cache: &'a dyn TranspositionCache, agent: usize) -> Self {
        Self {
            config,
            cache,
            agent,
            salt: 0,
            deadline: None,
            orderer: MoveOrderer::new(),
            solver: EndgameSolver::new(),
            pv: Vec::new(),
            prev_pv: Vec::new(),
            stats: SearchStats::default(),
        }
    }

    /// Search `root`, which must have the searching agent to move.
    pub fn run(&mut self, root: &Position) -> Result<SearchResult, SearchError> {
        let start = Instant::now();
        root.check_agent(self.agent)?;
        let horizon = if self.config.stop_at_round_end {
            ROUND_HORIZON_SALT
        } else {
            0
        };
        self.salt = KEYS.perspective(self.agent) ^ horizon;
        if root.is_terminal() {
            return Err(SearchError::NoLegalMoves);
        }
        if root.to_move() != self.agent {
            return Err(SearchError::NotToMove {
                agent: self.agent,
                to_move: root.to_move(),
            });
        }

        self.deadline = self.config.time_budget.map(|budget| start + budget);
        self.solver.set_deadline(self.deadline);
        let max_depth = self.config.max_depth.max(1);
        self.pv = vec![Vec::new(); max_depth as usize + 2];

        if self.config.solver_enabled() && applies(root, self.config.endgame_threshold) {
            if let Some(result) = self.solve_root(root, start)? {
                return Ok(result);
            }
        }

        let mut best: Option<RootOutcome> = None;
        let mut completion = Completion::Complete;
        for depth in 1..=max_depth {
            let mut work = root.clone();
            match self.search_root(&mut work, depth) {
                Ok(outcome) => {
                    debug!(
                        "Depth {} complete: move={} score={} nodes={} limited={}",
                        depth, outcome.best_move, outcome.score, self.stats.nodes, outcome.limited
                    );
                    self.stats.completed_depth = depth;
                    self.prev_pv = outcome.pv.clone();
                    let limited = outcome.limited;
                    best = Some(outcome);
                    if !limited {
                        break;
                    }
                    self.orderer.age();
                }
                Err(Stop::Deadline) => {
                    debug!("Deadline reached during depth {}", depth);
                    completion = Completion::DeadlineExceededPartial;
                    break;
                }
                Err(Stop::Failed(e)) => return Err(e),
            }
        }

        let outcome = match best {
            Some(outcome) => outcome,
            None => self.fallback(root)?,
        };
        self.stats.elapsed = start.elapsed();
        debug!(
            "Search done: move={} score={} depth={} nodes={} tt_hits={} elapsed={:?}",
            outcome.best_move,
            outcome.score,
            self.stats.completed_depth,
            self.stats.nodes,
            self.stats.tt_hits,
            self.stats.elapsed
        );

        Ok(SearchResult {
            best_move: outcome.best_move,
            principal_variation: outcome.pv,
            score: outcome.score,
            depth: self.stats.completed_depth,
            exact: !outcome.limited && completion.is_complete(),
            completion,
            stats: self.stats,
        })
    }

    /// Exact answer from the endgame solver. `None` when it ran out of time.
    fn solve_root(&mut self, root: &Position, start: Instant) -> Result<Option<SearchResult>, SearchError> {
        self.stats.solver_calls += 1;
        match self.solver.solve(root, self.agent) {
            Ok(solved) => {
                self.stats.nodes += solved.nodes;
                self.stats.completed_depth = solved.pv.len() as u32;
                self.stats.elapsed = start.elapsed();
                Ok(Some(SearchResult {
                    best_move: solved.best_move,
                    depth: solved.pv.len() as u32,
                    principal_variation: solved.pv,
                    score: solved.score,
                    exact: true,
                    completion: Completion::Complete,
                    stats: self.stats,
                }))
            }
            Err(SolverError::Interrupted { nodes }) => {
                debug!("Root endgame solve interrupted after {} nodes", nodes);
                self.stats.nodes += nodes;
                Ok(None)
            }
            Err(SolverError::NoLegalMoves) => Err(SearchError::NoLegalMoves),
            Err(SolverError::Engine(e)) => Err(e.into()),
        }
    }

    /// First ordered root move with its static score, for when not even
    /// depth 1 finished.
    fn fallback(&self, root: &Position) -> Result<RootOutcome, SearchError> {
        let mut moves = legal_moves(root);
        let tt_move = self
            .cache
            .probe(self.key(root))
            .and_then(|entry| entry.best_move)
            .filter(|&mv| is_legal(root, mv));
        self.orderer.order(root, &mut moves, 0, tt_move, None);
        let best_move = *moves.first().ok_or(SearchError::NoLegalMoves)?;
        let child = root.apply(best_move)?;
        Ok(RootOutcome {
            best_move,
            score: leaf_score(&child, self.agent),
            pv: vec![best_move],
            limited: true,
        })
    }

    #[inline]
    fn key(&self, pos: &Position) -> u64 {
        pos.structural_hash() ^ self.salt
    }

    fn check_deadline(&self) -> Result<(), Stop> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Stop::Deadline),
            _ => Ok(()),
        }
    }

    fn clear_pv(&mut self, ply: usize) {
        if let Some(line) = self.pv.get_mut(ply) {
            line.clear();
        }
    }

    fn update_pv(&mut self, ply: usize, mv: Move) {
        let (head, tail) = self.pv.split_at_mut(ply + 1);
        let line = &mut head[ply];
        line.clear();
        line.push(mv);
        if let Some(rest) = tail.first() {
            line.extend_from_slice(rest);
        }
    }

    /// Root of one iteration. Every move gets an exact value or a proof that
    /// it is worse than the best so far; equal values go to the smallest move.
    fn search_root(&mut self, pos: &mut Position, depth: u32) -> Result<RootOutcome, Stop> {
        self.stats.nodes += 1;
        self.check_deadline()?;
        self.clear_pv(0);

        let key = self.key(pos);
        let tt_move = self
            .cache
            .probe(key)
            .and_then(|entry| entry.best_move)
            .filter(|&mv| is_legal(pos, mv));
        if tt_move.is_some() {
            self.stats.tt_hits += 1;
        }

        let mut moves = legal_moves(pos);
        if moves.is_empty() {
            return Err(Stop::Failed(SearchError::NoLegalMoves));
        }
        let pv_move = self.prev_pv.first().copied();
        self.orderer.order(pos, &mut moves, 0, tt_move, pv_move);

        let mut best: Option<(Move, i32)> = None;
        let mut limited = false;
        for mv in moves {
            let alpha = best.map_or(-INF, |(_, score)| score - 1);
            let eval = self.child(pos, mv, depth, 1, alpha, INF)?;
            limited |= eval.limited;
            let better = match best {
                None => true,
                Some((best_mv, score)) => eval.score > score || (eval.score == score && mv < best_mv),
            };
            if better {
                best = Some((mv, eval.score));
                self.update_pv(0, mv);
            }
        }

        let (best_move, score) = best.ok_or(Stop::Failed(SearchError::NoLegalMoves))?;
        self.cache.store(
            key,
            TtEntry {
                depth: if limited { stored_depth(depth) } else { EXACT_DEPTH },
                score,
                bound: Bound::Exact,
                best_move: Some(best_move),
            },
        );
        Ok(RootOutcome {
            best_move,
            score,
            pv: self.pv[0].clone(),
            limited,
        })
    }

    /// Play `mv`, value the child, and take the move back.
    fn child(
        &mut self,
        pos: &mut Position,
        mv: Move,
        depth: u32,
        ply: usize,
        alpha: i32,
        beta: i32,
    ) -> Result<Eval, Stop> {
        let undo = pos.play(mv)?;
        let horizon = undo.crossed_round() && self.config.stop_at_round_end;
        let result = if horizon || pos.is_terminal() {
            self.clear_pv(ply);
            Ok(Eval {
                score: leaf_score(pos, self.agent),
                limited: false,
            })
        } else {
            self.node(pos, depth - 1, ply, alpha, beta)
        };
        pos.undo(undo);
        result
    }

    fn node(
        &mut self,
        pos: &mut Position,
        depth: u32,
        ply: usize,
        mut alpha: i32,
        mut beta: i32,
    ) -> Result<Eval, Stop> {
        self.stats.nodes += 1;
        self.check_deadline()?;
        self.clear_pv(ply);

        if self.config.solver_enabled() && applies(pos, self.config.endgame_threshold) {
            self.stats.solver_calls += 1;
            let score = self.solver.value(pos, self.agent)?;
            return Ok(Eval {
                score,
                limited: false,
            });
        }
        if depth == 0 {
            return Ok(Eval {
                score: leaf_score(pos, self.agent),
                limited: true,
            });
        }

        let key = self.key(pos);
        let mut tt_move = None;
        if let Some(hit) = self.cache.probe_window(key, stored_depth(depth), alpha, beta) {
            self.stats.tt_hits += 1;
            if let Some(score) = hit.cutoff {
                self.stats.tt_cutoffs += 1;
                trace!("TT cutoff at ply {}: score={}", ply, score);
                return Ok(Eval {
                    score,
                    limited: hit.entry.depth != EXACT_DEPTH,
                });
            }
            tt_move = hit.entry.best_move.filter(|&mv| is_legal(pos, mv));
        }

        let mut moves = legal_moves(pos);
        if moves.is_empty() {
            return Err(EngineError::StateInvariantViolation(
                "non-terminal position without legal moves".into(),
            )
            .into());
        }
        let pv_move = self.prev_pv.get(ply).copied();
        self.orderer.order(pos, &mut moves, ply, tt_move, pv_move);

        let maximize = pos.to_move() == self.agent;
        let (alpha_in, beta_in) = (alpha, beta);
        let mut best = if maximize { -INF } else { INF };
        let mut best_move = moves[0];
        let mut limited = false;
        for mv in moves {
            let eval = self.child(pos, mv, depth, ply + 1, alpha, beta)?;
            limited |= eval.limited;
            let improved = if maximize {
                eval.score > best
            } else {
                eval.score < best
            };
            if improved {
                best = eval.score;
                best_move = mv;
                self.update_pv(ply, mv);
            }
            if maximize {
                alpha = alpha.max(best);
            } else {
                beta = beta.min(best);
            }
            if alpha >= beta {
                self.orderer.record_cutoff(mv, ply, depth);
                break;
            }
        }

        let bound = if best <= alpha_in {
            Bound::Upper
        } else if best >= beta_in {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.cache.store(
            key,
            TtEntry {
                depth: if limited { stored_depth(depth) } else { EXACT_DEPTH },
                score: best,
                bound,
                best_move: Some(best_move),
            },
        );
        Ok(Eval {
            score: best,
            limited,
        })
    }
}

fn stored_depth(depth: u32) -> u8 {
    depth.min(EXACT_DEPTH as u32 - 1) as u8
}

/// Search `root` for `agent` with a fresh table unless `cache` is given.
pub fn search(
    root: &Position,
    agent: usize,
    config: &AlphaBetaConfig,
    cache: Option<&dyn TranspositionCache>,
) -> Result<SearchResult, SearchError> {
    root.check_agent(agent)?;
    match cache {
        Some(cache) => AlphaBetaSearch::new(config, cache, agent).run(root),
        None => {
            let table = TranspositionTable::new(config.tt_size_mb);
            AlphaBetaSearch::new(config, &table, agent).run(root)
        }
    }
}
