//! Errors raised by the position model.

use crate::moves::Move;

/// Errors raised while constructing or mutating a [`crate::Position`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The move is not legal in the current position. A caller bug, not a
    /// user-facing condition.
    #[error("Invalid move {mv}: {reason}")]
    InvalidMove { mv: Move, reason: &'static str },

    /// Conservation or a structural invariant is broken. Searches abort on
    /// this rather than return a wrong answer.
    #[error("State invariant violated: {0}")]
    StateInvariantViolation(String),

    #[error("Agent {agent} out of range for a {agents}-agent game")]
    AgentOutOfRange { agent: usize, agents: usize },

    #[error("Unsupported agent count {0}, expected 2 to 4")]
    UnsupportedAgentCount(usize),
}

impl EngineError {
    pub(crate) fn invalid(mv: Move, reason: &'static str) -> Self {
        EngineError::InvalidMove { mv, reason }
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        EngineError::StateInvariantViolation(msg.into())
    }

    /// True for errors that indicate a corrupted position.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::StateInvariantViolation(_))
    }
}

/// How a search finished. Running out of time is a normal outcome that
/// still carries the best answer found, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Completion {
    /// Every requested depth or iteration was searched, or the answer is
    /// exact.
    Complete,
    /// The deadline stopped the search early; the result is the best found
    /// so far.
    DeadlineExceededPartial,
}

impl Completion {
    pub fn is_complete(self) -> bool {
        self == Completion::Complete
    }
}
