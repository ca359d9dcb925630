//! Rollout policies.
//!
//! A policy supplies the priors for newly expanded nodes, optionally a
//! direct leaf value, and the move choices of playouts. The search holds
//! one behind `Box<dyn RolloutPolicy>`, built from [`RolloutKind`].

use crate::bounded::BoundedEvaluator;
use crate::config::{MctsConfig, RolloutKind};
use crate::evaluator::{heuristic_policy, uniform, Evaluator, EvaluatorError};
use engine_core::{EngineError, Move, Position};
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What a policy knows about a freshly reached leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafEstimate {
    /// Prior per legal move, aligned with the moves passed in.
    pub priors: Vec<f32>,
    /// Value for the searching agent when the policy can give one without
    /// a playout.
    pub value: Option<f32>,
}

pub trait RolloutPolicy: Send {
    fn kind(&self) -> RolloutKind;

    /// Priors (and maybe a value for `agent`) at `pos`, whose legal moves
    /// are `moves`. `pos` may be played and undone but ends unchanged.
    fn estimate(&mut self, pos: &mut Position, moves: &[Move], agent: usize) -> Result<LeafEstimate, EngineError>;

    /// Next playout move, one of `moves`.
    fn choose(&mut self, pos: &mut Position, moves: &[Move], rng: &mut ChaCha20Rng) -> Result<Move, EngineError>;

    /// True once the policy has given up on an external evaluator.
    fn degraded(&self) -> bool {
        false
    }
}

/// Uniform priors and uniform playouts.
#[derive(Debug, Clone, Default)]
pub struct RandomRollout;

impl RolloutPolicy for RandomRollout {
    fn kind(&self) -> RolloutKind {
        RolloutKind::Random
    }

    fn estimate(&mut self, _pos: &mut Position, moves: &[Move], _agent: usize) -> Result<LeafEstimate, EngineError> {
        Ok(LeafEstimate {
            priors: uniform(moves.len()),
            value: None,
        })
    }

    fn choose(&mut self, _pos: &mut Position, moves: &[Move], rng: &mut ChaCha20Rng) -> Result<Move, EngineError> {
        if moves.is_empty() {
            return Err(no_moves());
        }
        Ok(moves[rng.gen_range(0..moves.len())])
    }
}

/// Heuristic-weighted priors and playouts.
#[derive(Debug, Clone)]
pub struct HeavyRollout {
    temperature: f32,
}

impl HeavyRollout {
    pub fn new(temperature: f32) -> Self {
        Self { temperature }
    }
}

impl RolloutPolicy for HeavyRollout {
    fn kind(&self) -> RolloutKind {
        RolloutKind::Heavy
    }

    fn estimate(&mut self, pos: &mut Position, moves: &[Move], _agent: usize) -> Result<LeafEstimate, EngineError> {
        Ok(LeafEstimate {
            priors: heuristic_policy(pos, moves, self.temperature)?,
            value: None,
        })
    }

    fn choose(&mut self, pos: &mut Position, moves: &[Move], rng: &mut ChaCha20Rng) -> Result<Move, EngineError> {
        let weights = heuristic_policy(pos, moves, self.temperature)?;
        sample_index(&weights, rng)
            .map(|i| moves[i])
            .ok_or_else(no_moves)
    }
}

/// Priors and values from a supplied evaluator. After the first failed
/// call the evaluator is left alone for the rest of the search and the
/// heavy policy takes over.
pub struct ExternalRollout {
    evaluator: BoundedEvaluator,
    fallback: HeavyRollout,
    deadline: Option<Instant>,
    degraded: bool,
}

impl ExternalRollout {
    pub fn new(evaluator: BoundedEvaluator, temperature: f32, deadline: Option<Instant>) -> Self {
        Self {
            evaluator,
            fallback: HeavyRollout::new(temperature),
            deadline,
            degraded: false,
        }
    }

    fn remaining(&self) -> Duration {
        match self.deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => self.evaluator.timeout(),
        }
    }
}

impl RolloutPolicy for ExternalRollout {
    fn kind(&self) -> RolloutKind {
        RolloutKind::External
    }

    fn estimate(&mut self, pos: &mut Position, moves: &[Move], agent: usize) -> Result<LeafEstimate, EngineError> {
        if !self.degraded {
            match self.evaluator.infer_within(pos, agent, moves, self.remaining()) {
                Ok(inference) => {
                    return Ok(LeafEstimate {
                        priors: inference.policy,
                        value: Some(inference.value),
                    })
                }
                Err(e @ EvaluatorError::Timeout(_)) => {
                    warn!("{}; using heuristic rollouts for the rest of this search", e);
                    self.degraded = true;
                }
                Err(e) => {
                    warn!("Evaluator failed: {}; using heuristic rollouts for the rest of this search", e);
                    self.degraded = true;
                }
            }
        }
        self.fallback.estimate(pos, moves, agent)
    }

    fn choose(&mut self, pos: &mut Position, moves: &[Move], rng: &mut ChaCha20Rng) -> Result<Move, EngineError> {
        self.fallback.choose(pos, moves, rng)
    }

    fn degraded(&self) -> bool {
        self.degraded
    }
}

/// Build the configured policy. `External` without an evaluator, or with
/// one whose worker cannot start, falls back to `Heavy`.
pub fn build_policy(
    config: &MctsConfig,
    evaluator: Option<Arc<dyn Evaluator>>,
    deadline: Option<Instant>,
) -> Box<dyn RolloutPolicy> {
    match (config.rollout, evaluator) {
        (RolloutKind::Random, _) => Box::new(RandomRollout),
        (RolloutKind::Heavy, _) => Box::new(HeavyRollout::new(config.heavy_temperature)),
        (RolloutKind::External, Some(evaluator)) => {
            match BoundedEvaluator::spawn(evaluator, config.evaluator_timeout) {
                Ok(bounded) => Box::new(ExternalRollout::new(bounded, config.heavy_temperature, deadline)),
                Err(e) => {
                    warn!("{}; using heavy rollouts", e);
                    Box::new(HeavyRollout::new(config.heavy_temperature))
                }
            }
        }
        (RolloutKind::External, None) => {
            debug!("External rollout policy configured without an evaluator, using heavy");
            Box::new(HeavyRollout::new(config.heavy_temperature))
        }
    }
}

/// Sample an index from a probability distribution.
fn sample_index(weights: &[f32], rng: &mut ChaCha20Rng) -> Option<usize> {
    let r: f32 = rng.gen();
    let mut cumsum = 0.0;

    for (i, &p) in weights.iter().enumerate() {
        cumsum += p;
        if r < cumsum {
            return Some(i);
        }
    }

    // Fallback to last non-zero entry (handles floating point issues)
    weights.iter().rposition(|&p| p > 0.0)
}

fn no_moves() -> EngineError {
    EngineError::StateInvariantViolation("playout position without legal moves".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{Inference, UniformEvaluator};
    use engine_core::legal_moves;
    use rand::SeedableRng;

    struct FixedEvaluator;

    impl Evaluator for FixedEvaluator {
        fn infer(&self, _pos: &Position, _agent: usize, moves: &[Move]) -> Result<Inference, EvaluatorError> {
            let mut policy = vec![0.0; moves.len()];
            policy[0] = 1.0;
            Ok(Inference { policy, value: 0.5 })
        }
    }

    struct FailingEvaluator;

    impl Evaluator for FailingEvaluator {
        fn infer(&self, _pos: &Position, _agent: usize, _moves: &[Move]) -> Result<Inference, EvaluatorError> {
            Err(EvaluatorError::EvaluationFailed("no model".into()))
        }
    }

    #[test]
    fn test_random_policy_is_uniform_and_seeded() {
        let mut pos = Position::new(2, 2).unwrap();
        let moves = legal_moves(&pos);
        let mut policy = RandomRollout;
        let estimate = policy.estimate(&mut pos, &moves, 0).unwrap();
        assert!(estimate.value.is_none());
        assert_eq!(estimate.priors.len(), moves.len());

        let pick = |seed| {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            (0..10)
                .map(|_| RandomRollout.choose(&mut pos.clone(), &moves, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(pick(3), pick(3));
    }

    #[test]
    fn test_heavy_choice_is_legal_and_position_restored() {
        let pos = Position::new(3, 5).unwrap();
        let moves = legal_moves(&pos);
        let mut scratch = pos.clone();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut policy = HeavyRollout::new(1.0);
        for _ in 0..20 {
            let mv = policy.choose(&mut scratch, &moves, &mut rng).unwrap();
            assert!(moves.contains(&mv));
        }
        assert_eq!(scratch, pos);
    }

    #[test]
    fn test_external_uses_evaluator() {
        let mut pos = Position::new(2, 2).unwrap();
        let moves = legal_moves(&pos);
        let bounded = BoundedEvaluator::spawn(Arc::new(FixedEvaluator), Duration::from_secs(5)).unwrap();
        let mut policy = ExternalRollout::new(bounded, 1.0, None);
        let estimate = policy.estimate(&mut pos, &moves, 0).unwrap();
        assert_eq!(estimate.value, Some(0.5));
        assert!((estimate.priors[0] - 1.0).abs() < 1e-6);
        assert!(!policy.degraded());
    }

    #[test]
    fn test_external_degrades_on_failure() {
        let mut pos = Position::new(2, 2).unwrap();
        let moves = legal_moves(&pos);
        let bounded = BoundedEvaluator::spawn(Arc::new(FailingEvaluator), Duration::from_secs(5)).unwrap();
        let mut policy = ExternalRollout::new(bounded, 1.0, None);
        let estimate = policy.estimate(&mut pos, &moves, 0).unwrap();
        assert!(estimate.value.is_none());
        assert!(policy.degraded());
        let sum: f32 = estimate.priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_build_policy_selects_by_config() {
        let config = MctsConfig::for_testing();
        assert_eq!(build_policy(&config, None, None).kind(), RolloutKind::Random);

        let heavy = config.clone().with_rollout(RolloutKind::Heavy);
        assert_eq!(build_policy(&heavy, None, None).kind(), RolloutKind::Heavy);

        let external = config.with_rollout(RolloutKind::External);
        assert_eq!(build_policy(&external, None, None).kind(), RolloutKind::Heavy);
        let evaluator: Arc<dyn Evaluator> = Arc::new(UniformEvaluator);
        assert_eq!(
            build_policy(&external, Some(evaluator), None).kind(),
            RolloutKind::External
        );
    }

    #[test]
    fn test_sample_index() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert_eq!(sample_index(&[0.0, 1.0, 0.0], &mut rng), Some(1));
        assert_eq!(sample_index(&[], &mut rng), None);
    }
}
