//! Evaluator trait for position evaluation.
//!
//! An evaluator provides a policy over the legal moves and a value estimate
//! for a position. Learned evaluators live outside this crate; the
//! uniform and heuristic evaluators here cover testing and the no-model
//! case.

use engine_core::heuristic::{evaluate, leaf_score, value_to_unit};
use engine_core::{Move, Position};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluatorError {
    #[error("Evaluator did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Invalid evaluator output: {0}")]
    InvalidOutput(String),

    #[error("Evaluator worker disconnected")]
    Disconnected,
}

/// Result of evaluating a position.
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    /// Probability of each move, aligned with the `moves` slice passed to
    /// [`Evaluator::infer`].
    pub policy: Vec<f32>,

    /// Value estimate for the requested agent.
    /// Range: -1.0 (certain loss) to +1.0 (certain win).
    pub value: f32,
}

impl Inference {
    /// Check shape and range, and normalize the policy.
    pub fn validated(mut self, num_moves: usize) -> Result<Self, EvaluatorError> {
        if self.policy.len() != num_moves {
            return Err(EvaluatorError::InvalidOutput(format!(
                "policy has {} entries for {} moves",
                self.policy.len(),
                num_moves
            )));
        }
        if self.policy.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(EvaluatorError::InvalidOutput(
                "policy contains a negative or non-finite entry".into(),
            ));
        }
        if !self.value.is_finite() {
            return Err(EvaluatorError::InvalidOutput("value is not finite".into()));
        }
        self.value = self.value.clamp(-1.0, 1.0);

        let sum: f32 = self.policy.iter().sum();
        if sum > 0.0 {
            for p in &mut self.policy {
                *p /= sum;
            }
        } else if num_moves > 0 {
            self.policy = uniform(num_moves);
        }
        Ok(self)
    }
}

/// Trait for position evaluators.
///
/// Implementations must be callable from a worker thread. A call may be
/// abandoned by the search when it runs past its timeout.
pub trait Evaluator: Send + Sync {
    /// Evaluate `pos`.
    ///
    /// # Arguments
    /// * `pos` - Position to evaluate
    /// * `agent` - Agent whose value is wanted
    /// * `moves` - Legal moves of the agent to move, in generation order
    ///
    /// # Returns
    /// Policy over `moves` and a value estimate for `agent`
    fn infer(&self, pos: &Position, agent: usize, moves: &[Move]) -> Result<Inference, EvaluatorError>;
}

/// Uniform evaluator that assigns equal probability to all legal moves.
/// Value is always 0.0 (neutral). Useful for testing MCTS without a model.
#[derive(Debug, Clone, Default)]
pub struct UniformEvaluator;

impl UniformEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for UniformEvaluator {
    fn infer(&self, _pos: &Position, _agent: usize, moves: &[Move]) -> Result<Inference, EvaluatorError> {
        Ok(Inference {
            policy: uniform(moves.len()),
            value: 0.0,
        })
    }
}

/// Evaluator built on the static heuristic: softmax policy over child
/// estimates and the squashed leaf score as value.
#[derive(Debug, Clone)]
pub struct HeuristicEvaluator {
    pub temperature: f32,
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self { temperature: 1.0 }
    }
}

impl HeuristicEvaluator {
    pub fn new(temperature: f32) -> Self {
        Self { temperature }
    }
}

impl Evaluator for HeuristicEvaluator {
    fn infer(&self, pos: &Position, agent: usize, moves: &[Move]) -> Result<Inference, EvaluatorError> {
        let mut scratch = pos.clone();
        let policy = heuristic_policy(&mut scratch, moves, self.temperature)
            .map_err(|e| EvaluatorError::EvaluationFailed(e.to_string()))?;
        Ok(Inference {
            policy,
            value: value_to_unit(leaf_score(pos, agent)),
        })
    }
}

pub(crate) fn uniform(n: usize) -> Vec<f32> {
    if n == 0 {
        Vec::new()
    } else {
        vec![1.0 / n as f32; n]
    }
}

/// Softmax over the heuristic value of each child for the agent to move.
/// `pos` is played and undone in place and ends unchanged.
pub fn heuristic_policy(
    pos: &mut Position,
    moves: &[Move],
    temperature: f32,
) -> Result<Vec<f32>, engine_core::EngineError> {
    let mover = pos.to_move();
    let mut values = Vec::with_capacity(moves.len());
    for &mv in moves {
        let undo = pos.play(mv)?;
        values.push(evaluate(pos, mover));
        pos.undo(undo);
    }
    Ok(softmax(&values, temperature))
}

/// Numerically stable softmax. A non-positive temperature acts as a small
/// positive one.
pub fn softmax(values: &[f64], temperature: f32) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }
    let t = (temperature as f64).max(1e-3);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| ((v - max) / t).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| (e / sum) as f32).collect()
}
