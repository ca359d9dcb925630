//! MCTS search implementation.
//!
//! Implements the core MCTS algorithm:
//! 1. Selection: Traverse tree using PUCT to find a leaf, adding virtual loss
//! 2. Expansion: Add every legal child with priors from the rollout policy
//! 3. Evaluation: Endgame solver, evaluator value, or a playout
//! 4. Backpropagation: Update statistics along the path, removing virtual loss

use engine_core::heuristic::{leaf_score, value_to_unit};
use engine_core::{generate_into, legal_moves, Completion, EngineError, Move, Position};
use endgame::{applies, EndgameSolver, SolverError};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::MctsConfig;
use crate::evaluator::Evaluator;
use crate::node::NodeId;
use crate::rollout::{build_policy, RolloutPolicy};
use crate::tree::MctsTree;

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Agent {agent} is not to move (agent {to_move} is)")]
    NotToMove { agent: usize, to_move: usize },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Counters collected during one search.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchStats {
    pub iterations: u32,
    pub tree_nodes: usize,
    pub playouts: u32,
    pub solver_calls: u32,
    pub evaluator_degraded: bool,
    pub elapsed: Duration,
}

/// Result of an MCTS search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub best_move: Move,

    /// Share of root visits per move, in generation order.
    pub visit_distribution: Vec<(Move, f32)>,

    /// Root value for the searching agent, in [-1, 1].
    pub value: f32,

    pub iterations: u32,

    pub completion: Completion,

    pub stats: SearchStats,
}

/// MCTS search state.
pub struct MctsSearch {
    tree: MctsTree,
    config: MctsConfig,
    policy: Box<dyn RolloutPolicy>,
    solver: EndgameSolver,
    rng: ChaCha20Rng,
    agent: usize,
    deadline: Option<Instant>,
    start: Instant,
    stats: SearchStats,
}

impl MctsSearch {
    /// Create a search from `root` for `agent`, which must be to move. The
    /// clock starts here.
    pub fn new(
        root: &Position,
        agent: usize,
        config: MctsConfig,
        evaluator: Option<Arc<dyn Evaluator>>,
    ) -> Result<Self, SearchError> {
        root.check_agent(agent)?;
        if root.is_terminal() {
            return Err(SearchError::NoLegalMoves);
        }
        if root.to_move() != agent {
            return Err(SearchError::NotToMove {
                agent,
                to_move: root.to_move(),
            });
        }

        let start = Instant::now();
        let deadline = config.time_budget.map(|budget| start + budget);
        let mut solver = EndgameSolver::new();
        solver.set_deadline(deadline);

        Ok(Self {
            tree: MctsTree::new(root.clone(), agent),
            policy: build_policy(&config, evaluator, deadline),
            rng: ChaCha20Rng::seed_from_u64(config.seed),
            config,
            solver,
            agent,
            deadline,
            start,
            stats: SearchStats::default(),
        })
    }

    /// Run until the iteration cap or the deadline.
    pub fn run(&mut self) -> Result<SearchResult, SearchError> {
        if let Some(result) = self.solve_root()? {
            return Ok(result);
        }

        let root = self.tree.root();
        self.expand_root()?;
        if self.config.noise_enabled() {
            self.add_dirichlet_noise();
        }

        let mut completion = Completion::Complete;
        while self.stats.iterations < self.config.iterations {
            if self.deadline_passed() {
                completion = Completion::DeadlineExceededPartial;
                break;
            }
            self.simulate()?;
            self.stats.iterations += 1;
        }

        let (best_move, visits) = self.tree.best_move().ok_or(SearchError::NoLegalMoves)?;
        let tree_stats = self.tree.stats();
        self.stats.tree_nodes = tree_stats.total_nodes;
        self.stats.evaluator_degraded = self.policy.degraded();
        self.stats.elapsed = self.start.elapsed();

        debug!(
            "MCTS done: move={} visits={} value={:.3} iterations={} nodes={} depth={} elapsed={:?}",
            best_move,
            visits,
            tree_stats.root_value,
            self.stats.iterations,
            tree_stats.total_nodes,
            tree_stats.max_depth,
            self.stats.elapsed
        );

        Ok(SearchResult {
            best_move,
            visit_distribution: self.tree.visit_distribution(),
            value: self.tree.get(root).mean_value(),
            iterations: self.stats.iterations,
            completion,
            stats: self.stats,
        })
    }

    /// Exact answer when the root itself is small enough for the solver.
    fn solve_root(&mut self) -> Result<Option<SearchResult>, SearchError> {
        let root = self.tree.position(self.tree.root())?.clone();
        if !self.solver_applies(&root) {
            return Ok(None);
        }
        self.stats.solver_calls += 1;
        match self.solver.solve(&root, self.agent) {
            Ok(solved) => {
                self.stats.elapsed = self.start.elapsed();
                Ok(Some(SearchResult {
                    best_move: solved.best_move,
                    visit_distribution: vec![(solved.best_move, 1.0)],
                    value: value_to_unit(solved.score),
                    iterations: 0,
                    completion: Completion::Complete,
                    stats: self.stats,
                }))
            }
            Err(SolverError::Interrupted { nodes }) => {
                debug!("Root endgame solve interrupted after {} nodes", nodes);
                Ok(None)
            }
            Err(e) => Err(solver_failure(e)),
        }
    }

    fn solver_applies(&self, pos: &Position) -> bool {
        self.config.endgame_threshold > 0 && applies(pos, self.config.endgame_threshold)
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.map_or(false, |deadline| Instant::now() >= deadline)
    }

    fn expand_root(&mut self) -> Result<(), SearchError> {
        let root = self.tree.root();
        if self.tree.get(root).is_expanded() {
            return Ok(());
        }
        let mut pos = self.tree.position(root)?.clone();
        self.expand(root, &mut pos)?;
        Ok(())
    }

    /// Run a single simulation (select -> expand -> evaluate -> backpropagate).
    fn simulate(&mut self) -> Result<(), SearchError> {
        let (leaf_id, path) = self.select();
        self.tree.apply_virtual_loss(&path, self.config.virtual_loss);

        let value = self.evaluate_leaf(leaf_id)?;
        self.tree.backpropagate(leaf_id, value, self.config.virtual_loss);

        trace!(
            leaf = leaf_id.0,
            path_len = path.len(),
            value = value,
            "MCTS simulation complete"
        );
        Ok(())
    }

    /// Select a leaf node by traversing the tree using PUCT.
    fn select(&self) -> (NodeId, Vec<NodeId>) {
        let mut path = vec![self.tree.root()];
        let mut current = self.tree.root();

        loop {
            let node = self.tree.get(current);
            if node.is_leaf() {
                break;
            }
            match self.tree.select_child(current, self.config.c_puct) {
                Some(child_id) => {
                    path.push(child_id);
                    current = child_id;
                }
                None => break,
            }
        }

        (current, path)
    }

    /// Value of a selected leaf for the searching agent, expanding it when
    /// it is not settled.
    fn evaluate_leaf(&mut self, leaf_id: NodeId) -> Result<f32, SearchError> {
        if let Some(value) = self.tree.get(leaf_id).exact_value {
            return Ok(value);
        }
        let mut pos = self.tree.position(leaf_id)?.clone();

        if pos.is_terminal() {
            let value = value_to_unit(leaf_score(&pos, self.agent));
            self.tree.get_mut(leaf_id).exact_value = Some(value);
            return Ok(value);
        }

        if self.solver_applies(&pos) {
            self.stats.solver_calls += 1;
            match self.solver.value(&pos, self.agent) {
                Ok(score) => {
                    let value = value_to_unit(score);
                    self.tree.get_mut(leaf_id).exact_value = Some(value);
                    return Ok(value);
                }
                // Out of time for exact answers; the playout below still is.
                Err(SolverError::Interrupted { .. }) => {}
                Err(e) => return Err(solver_failure(e)),
            }
        }

        match self.expand(leaf_id, &mut pos)? {
            Some(value) => Ok(value),
            None => self.playout(pos),
        }
    }

    /// Add every legal child of `node_id`. Returns the policy's direct value
    /// estimate, if it gave one.
    fn expand(&mut self, node_id: NodeId, pos: &mut Position) -> Result<Option<f32>, SearchError> {
        let moves = legal_moves(pos);
        if moves.is_empty() {
            return Err(EngineError::StateInvariantViolation(
                "non-terminal position without legal moves".into(),
            )
            .into());
        }
        let estimate = self.policy.estimate(pos, &moves, self.agent)?;
        for (&mv, &prior) in moves.iter().zip(estimate.priors.iter()) {
            self.tree.add_child(node_id, mv, prior);
        }
        Ok(estimate.value)
    }

    /// Play the rollout policy from `pos` until the game ends or the rollout
    /// depth runs out, and score the result.
    fn playout(&mut self, mut pos: Position) -> Result<f32, SearchError> {
        self.stats.playouts += 1;
        let mut moves = Vec::new();
        for _ in 0..self.config.rollout_depth {
            if pos.is_terminal() {
                break;
            }
            moves.clear();
            generate_into(&pos, &mut moves);
            let mv = self.policy.choose(&mut pos, &moves, &mut self.rng)?;
            pos.play(mv)?;
        }
        Ok(value_to_unit(leaf_score(&pos, self.agent)))
    }

    /// Add Dirichlet noise to root node priors for exploration.
    fn add_dirichlet_noise(&mut self) {
        let root_id = self.tree.root();
        let children: Vec<NodeId> = self.tree.get(root_id).children.iter().map(|(_, id)| *id).collect();
        if children.is_empty() {
            return;
        }

        let noise = match dirichlet_noise(children.len(), self.config.dirichlet_alpha, &mut self.rng) {
            Some(noise) => noise,
            None => return,
        };
        let eps = self.config.dirichlet_epsilon;
        for (child_id, n) in children.into_iter().zip(noise) {
            let child = self.tree.get_mut(child_id);
            child.prior = (1.0 - eps) * child.prior + eps * n;
        }
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &MctsTree {
        &self.tree
    }
}

fn solver_failure(e: SolverError) -> SearchError {
    match e {
        SolverError::Engine(e) => SearchError::Engine(e),
        SolverError::NoLegalMoves | SolverError::Interrupted { .. } => SearchError::NoLegalMoves,
    }
}

/// Generate Dirichlet-distributed noise using Gamma variates. `None` for a
/// non-positive alpha.
fn dirichlet_noise(n: usize, alpha: f32, rng: &mut ChaCha20Rng) -> Option<Vec<f32>> {
    use rand_distr::{Distribution, Gamma};

    let gamma = Gamma::new(alpha as f64, 1.0).ok()?;
    let mut samples: Vec<f32> = (0..n).map(|_| gamma.sample(rng) as f32).collect();

    // Normalize
    let sum: f32 = samples.iter().sum();
    if sum > 0.0 {
        for s in &mut samples {
            *s /= sum;
        }
    }

    Some(samples)
}

/// Convenience function to run a single MCTS search.
pub fn run_mcts(
    root: &Position,
    agent: usize,
    config: MctsConfig,
    evaluator: Option<Arc<dyn Evaluator>>,
) -> Result<SearchResult, SearchError> {
    MctsSearch::new(root, agent, config, evaluator)?.run()
}
