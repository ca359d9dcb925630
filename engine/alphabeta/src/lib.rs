//! Exact-mode search for the Tessera engine
//!
//! Iterative-deepening alpha-beta under the paranoid assumption: the
//! searching agent maximizes its margin over the best opponent and every
//! other agent minimizes it. Building blocks:
//!
//! - [`TranspositionTable`]: lock-free two-way bucketed cache, shareable
//!   between concurrent searches through the [`TranspositionCache`] trait
//! - [`MoveOrderer`]: cache move, previous PV, killers, history
//! - [`AlphaBetaSearch`]: the search itself, deferring small positions to the
//!   endgame solver
//!
//! # Example
//!
//! ```rust
//! use alphabeta::{search, AlphaBetaConfig};
//! use engine_core::Position;
//!
//! let pos = Position::new(2, 7).unwrap();
//! let config = AlphaBetaConfig::for_testing().with_max_depth(2);
//! let result = search(&pos, 0, &config, None).unwrap();
//! assert!(engine_core::is_legal(&pos, result.best_move));
//! assert_eq!(result.depth, 2);
//! ```

pub mod config;
pub mod ordering;
pub mod search;
pub mod tt;

pub use config::AlphaBetaConfig;
pub use ordering::MoveOrderer;
pub use search::{search, AlphaBetaSearch, SearchError, SearchResult, SearchStats};
pub use tt::{Bound, TranspositionCache, TranspositionTable, TtEntry, TtHit};
