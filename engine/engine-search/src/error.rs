use engine_core::{EngineError, Move};
use thiserror::Error;

/// Errors returned by [`crate::search_exact`] and [`crate::search_hint`].
///
/// Running out of time is not an error; it is reported through
/// [`engine_core::Completion`] on the result.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Agent {agent} is not to move (agent {to_move} is)")]
    NotToMove { agent: usize, to_move: usize },

    /// A searcher produced a move the generator rejects.
    #[error("Search returned illegal move {0}")]
    IllegalResult(Move),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<alphabeta::SearchError> for SearchError {
    fn from(e: alphabeta::SearchError) -> Self {
        match e {
            alphabeta::SearchError::NoLegalMoves => SearchError::NoLegalMoves,
            alphabeta::SearchError::NotToMove { agent, to_move } => SearchError::NotToMove { agent, to_move },
            alphabeta::SearchError::Engine(e) => SearchError::Engine(e),
        }
    }
}

impl From<mcts::SearchError> for SearchError {
    fn from(e: mcts::SearchError) -> Self {
        match e {
            mcts::SearchError::NoLegalMoves => SearchError::NoLegalMoves,
            mcts::SearchError::NotToMove { agent, to_move } => SearchError::NotToMove { agent, to_move },
            mcts::SearchError::Engine(e) => SearchError::Engine(e),
        }
    }
}
