//! Endgame solver for the Tessera engine
//!
//! Once few tiles remain to draft, the rest of the round is small enough to
//! search exhaustively. The solver's answer is exact and supersedes the
//! heuristic searches.
//!
//! # Example
//!
//! ```rust
//! use endgame::{applies, EndgameSolver};
//! use engine_core::{Position, PositionParts, TileCounts};
//!
//! let mut parts = PositionParts::empty(2);
//! parts.factories[0] = TileCounts::new([1, 1, 0, 0, 0]);
//! let pos = Position::from_parts(parts.balance_discard()).unwrap();
//! assert!(applies(&pos, 6));
//!
//! let result = EndgameSolver::new().solve(&pos, 0).unwrap();
//! assert!(engine_core::is_legal(&pos, result.best_move));
//! ```

pub mod canonical;
pub mod solver;

pub use canonical::CanonicalPosition;
pub use solver::{applies, EndgameSolver, SolveResult, SolverError, MEMO_LIMIT};

#[cfg(test)]
mod tests;
