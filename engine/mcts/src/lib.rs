//! Monte Carlo Tree Search for hint-mode play.
//!
//! The search spends a bounded budget on an approximate answer when the
//! exact searcher would be too slow. It returns the most-visited root move
//! together with the visit distribution.
//!
//! # Overview
//!
//! Each simulation consists of four phases:
//!
//! 1. **Selection**: Traverse the tree using PUCT. Nodes where the searching
//!    agent moves maximize its value; every other agent minimizes it
//! 2. **Expansion**: Add a child per legal move, with priors from the
//!    rollout policy
//! 3. **Evaluation**: Exact value from the endgame solver when few tiles
//!    remain, the evaluator's value when one is configured, otherwise a
//!    playout scored with the static heuristic
//! 4. **Backpropagation**: Update visit counts and values along the path
//!
//! # Usage
//!
//! ```rust
//! use engine_core::{is_legal, Position};
//! use mcts::{run_mcts, MctsConfig};
//!
//! let pos = Position::new(2, 42).unwrap();
//! let result = run_mcts(&pos, 0, MctsConfig::for_testing(), None).unwrap();
//! assert!(is_legal(&pos, result.best_move));
//! ```
//!
//! # Rollout policies
//!
//! - [`RolloutKind::Random`]: uniform priors and playouts
//! - [`RolloutKind::Heavy`]: softmax over the static heuristic
//! - [`RolloutKind::External`]: a caller-supplied [`Evaluator`], run on a
//!   worker thread behind a timeout. The first failure switches the rest of
//!   the search to heavy rollouts.

pub mod bounded;
pub mod config;
pub mod evaluator;
pub mod node;
pub mod rollout;
pub mod search;
pub mod tree;

// Re-export main types
pub use bounded::BoundedEvaluator;
pub use config::{MctsConfig, RolloutKind, UnknownRollout};
pub use evaluator::{Evaluator, EvaluatorError, HeuristicEvaluator, Inference, UniformEvaluator};
pub use node::{MctsNode, NodeId};
pub use rollout::{build_policy, LeafEstimate, RolloutPolicy};
pub use search::{run_mcts, MctsSearch, SearchError, SearchResult, SearchStats};
pub use tree::{MctsTree, TreeStats};
