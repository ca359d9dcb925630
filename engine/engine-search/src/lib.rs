//! Move search entry points for the Tessera engine
//!
//! Two modes over the same position model:
//! - **Exact**: iterative-deepening alpha-beta with a transposition table,
//!   deferring to the endgame solver once few tiles remain
//! - **Hint**: time-boxed MCTS, optionally guided by an external evaluator
//!
//! Both modes return a single legal move without searching, and re-check
//! every move they return against the move generator.
//!
//! # Example
//!
//! ```rust
//! use engine_core::{is_legal, Position};
//! use engine_search::search_exact;
//!
//! let pos = Position::new(2, 7).unwrap();
//! let result = search_exact(&pos, 0, 2, None).unwrap();
//! assert!(is_legal(&pos, result.best_move));
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::{Engine, ExactResult, HintResult};
pub use error::SearchError;

use engine_core::Position;
use std::time::Duration;

/// [`Engine::search_exact`] with default settings and a fresh table.
pub fn search_exact(
    pos: &Position,
    agent: usize,
    max_depth: u32,
    time_budget: Option<Duration>,
) -> Result<ExactResult, SearchError> {
    Engine::default().search_exact(pos, agent, max_depth, time_budget)
}

/// [`Engine::search_hint`] with default settings and no evaluator.
pub fn search_hint(
    pos: &Position,
    agent: usize,
    time_budget: Option<Duration>,
    iteration_budget: u32,
) -> Result<HintResult, SearchError> {
    Engine::default().search_hint(pos, agent, time_budget, iteration_budget)
}
