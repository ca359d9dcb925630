//! The `Engine` handle and the two search modes.

use crate::config::EngineConfig;
use crate::error::SearchError;
use alphabeta::{SearchStats as ExactStats, TranspositionCache, TranspositionTable};
use engine_core::heuristic::{leaf_score, value_to_unit};
use engine_core::{is_legal, legal_moves, Completion, Move, Position};
use endgame::{applies, EndgameSolver, SolverError};
use mcts::{Evaluator, SearchStats as HintStats};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Idle tables kept for reuse.
const POOLED_TABLES: usize = 4;

/// Transposition tables for exact searches that have no shared cache. A
/// search takes a cleared table and hands it back afterwards, so tables are
/// not allocated and freed on every call while each search still owns its
/// table exclusively.
#[derive(Default)]
struct TablePool {
    idle: Mutex<Vec<TranspositionTable>>,
}

impl TablePool {
    fn take(&self, size_mb: usize) -> TranspositionTable {
        let reused = self.idle.lock().ok().and_then(|mut idle| {
            let i = idle.iter().position(|t| t.size_mb() == size_mb)?;
            Some(idle.swap_remove(i))
        });
        match reused {
            Some(table) => {
                table.clear();
                table
            }
            None => TranspositionTable::new(size_mb),
        }
    }

    fn give_back(&self, table: TranspositionTable) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < POOLED_TABLES {
                idle.push(table);
            }
        }
    }

    fn idle(&self) -> usize {
        self.idle.lock().map_or(0, |idle| idle.len())
    }
}

/// Result of an exact-mode search.
#[derive(Debug, Clone, PartialEq)]
pub struct ExactResult {
    pub best_move: Move,
    pub principal_variation: Vec<Move>,
    /// Centipoints for the searching agent.
    pub score: i32,
    /// Deepest completed iteration. 0 for a forced move or a fallback.
    pub depth: u32,
    pub completion: Completion,
    pub stats: ExactStats,
}

/// Result of a hint-mode search.
#[derive(Debug, Clone, PartialEq)]
pub struct HintResult {
    pub best_move: Move,
    pub visit_distribution: Vec<(Move, f32)>,
    /// Value for the searching agent in [-1, 1].
    pub estimated_value: f32,
    pub iterations: u32,
    pub completion: Completion,
    pub stats: HintStats,
}

/// Search front end. Holds the settings and the optional shared
/// collaborators; each call runs an independent search.
#[derive(Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    evaluator: Option<Arc<dyn Evaluator>>,
    cache: Option<Arc<dyn TranspositionCache>>,
    tables: Arc<TablePool>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            evaluator: None,
            cache: None,
            tables: Arc::default(),
        }
    }

    /// Evaluator used by the external rollout policy.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Transposition cache shared across exact searches. Without one every
    /// search gets a private table from the engine's pool.
    pub fn with_cache(mut self, cache: Arc<dyn TranspositionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Best move for `agent` by iterative-deepening alpha-beta, up to
    /// `max_depth` plies and within `time_budget` (`None` for no limit).
    pub fn search_exact(
        &self,
        pos: &Position,
        agent: usize,
        max_depth: u32,
        time_budget: Option<Duration>,
    ) -> Result<ExactResult, SearchError> {
        let moves = root_moves(pos, agent)?;
        let config = self
            .config
            .exact
            .clone()
            .with_max_depth(max_depth)
            .with_time_budget(time_budget);

        if let [mv] = moves[..] {
            let score = self.forced_score(pos, agent, mv, config.endgame_threshold, time_budget)?;
            debug!("Exact search: forced move {} score={}", mv, score);
            return Ok(ExactResult {
                best_move: mv,
                principal_variation: vec![mv],
                score,
                depth: 0,
                completion: Completion::Complete,
                stats: ExactStats::default(),
            });
        }

        let result = match self.cache.as_deref() {
            Some(cache) => alphabeta::search(pos, agent, &config, Some(cache)),
            None => {
                let table = self.tables.take(config.tt_size_mb);
                let result = alphabeta::search(pos, agent, &config, Some(&table));
                self.tables.give_back(table);
                result
            }
        }?;
        ensure_legal(pos, result.best_move)?;
        Ok(ExactResult {
            best_move: result.best_move,
            principal_variation: result.principal_variation,
            score: result.score,
            depth: result.depth,
            completion: result.completion,
            stats: result.stats,
        })
    }

    /// Approximate best move for `agent` by MCTS, stopping after
    /// `iteration_budget` iterations or `time_budget`, whichever comes first.
    pub fn search_hint(
        &self,
        pos: &Position,
        agent: usize,
        time_budget: Option<Duration>,
        iteration_budget: u32,
    ) -> Result<HintResult, SearchError> {
        let moves = root_moves(pos, agent)?;
        let config = self
            .config
            .hint
            .clone()
            .with_iterations(iteration_budget)
            .with_time_budget(time_budget);

        if let [mv] = moves[..] {
            let score = self.forced_score(pos, agent, mv, config.endgame_threshold, time_budget)?;
            debug!("Hint search: forced move {} score={}", mv, score);
            return Ok(HintResult {
                best_move: mv,
                visit_distribution: vec![(mv, 1.0)],
                estimated_value: value_to_unit(score),
                iterations: 0,
                completion: Completion::Complete,
                stats: HintStats::default(),
            });
        }

        let result = mcts::run_mcts(pos, agent, config, self.evaluator.clone())?;
        ensure_legal(pos, result.best_move)?;
        Ok(HintResult {
            best_move: result.best_move,
            visit_distribution: result.visit_distribution,
            estimated_value: result.value,
            iterations: result.iterations,
            completion: result.completion,
            stats: result.stats,
        })
    }

    /// Score of the only legal move: the solver's value when the position is
    /// below the threshold, else the static score of the child.
    fn forced_score(
        &self,
        pos: &Position,
        agent: usize,
        mv: Move,
        threshold: usize,
        time_budget: Option<Duration>,
    ) -> Result<i32, SearchError> {
        if threshold > 0 && applies(pos, threshold) {
            let mut solver = EndgameSolver::new();
            solver.set_deadline(time_budget.map(|budget| Instant::now() + budget));
            match solver.value(pos, agent) {
                Ok(score) => return Ok(score),
                Err(SolverError::Interrupted { .. }) => {}
                Err(SolverError::NoLegalMoves) => return Err(SearchError::NoLegalMoves),
                Err(SolverError::Engine(e)) => return Err(e.into()),
            }
        }
        Ok(leaf_score(&pos.apply(mv)?, agent))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("evaluator", &self.evaluator.is_some())
            .field("cache", &self.cache.is_some())
            .field("idle_tables", &self.tables.idle())
            .finish()
    }
}

/// Legal moves at the root, after checking that `agent` may search here.
fn root_moves(pos: &Position, agent: usize) -> Result<Vec<Move>, SearchError> {
    pos.check_agent(agent)?;
    if pos.is_terminal() {
        return Err(SearchError::NoLegalMoves);
    }
    if pos.to_move() != agent {
        return Err(SearchError::NotToMove {
            agent,
            to_move: pos.to_move(),
        });
    }
    let moves = legal_moves(pos);
    if moves.is_empty() {
        return Err(SearchError::NoLegalMoves);
    }
    Ok(moves)
}

fn ensure_legal(pos: &Position, mv: Move) -> Result<(), SearchError> {
    if is_legal(pos, mv) {
        Ok(())
    } else {
        Err(SearchError::IllegalResult(mv))
    }
}
