//! MCTS configuration parameters.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Playout and prior policy, chosen by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutKind {
    /// Uniform priors and uniformly random playouts.
    Random,
    /// Softmax over heuristic child values for both priors and playouts.
    Heavy,
    /// Priors and leaf values from the supplied evaluator, heavy fallback.
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown rollout policy '{0}', expected random, heavy or external")]
pub struct UnknownRollout(pub String);

impl FromStr for RolloutKind {
    type Err = UnknownRollout;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(RolloutKind::Random),
            "heavy" => Ok(RolloutKind::Heavy),
            "external" => Ok(RolloutKind::External),
            _ => Err(UnknownRollout(s.to_string())),
        }
    }
}

impl fmt::Display for RolloutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RolloutKind::Random => "random",
            RolloutKind::Heavy => "heavy",
            RolloutKind::External => "external",
        };
        f.write_str(name)
    }
}

/// Configuration for hint-mode Monte Carlo Tree Search.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Iteration cap per search.
    pub iterations: u32,

    /// Wall-clock budget. `None` runs exactly `iterations` iterations, which
    /// makes a seeded search reproducible.
    pub time_budget: Option<Duration>,

    /// Exploration constant for the PUCT formula.
    pub c_puct: f32,

    /// Penalty applied to every node on a selected path until its
    /// simulation is backed up. Steers concurrent selectors apart.
    pub virtual_loss: f32,

    pub rollout: RolloutKind,

    /// Maximum playout length in plies.
    pub rollout_depth: u32,

    /// Softmax temperature of the heavy policy, in game points.
    pub heavy_temperature: f32,

    /// Dirichlet noise alpha for the root priors.
    pub dirichlet_alpha: f32,

    /// Fraction of root prior taken from Dirichlet noise. 0 disables noise.
    pub dirichlet_epsilon: f32,

    /// Seed of the search RNG.
    pub seed: u64,

    /// Leaves with fewer draftable tiles are valued by the endgame solver.
    /// 0 disables the solver.
    pub endgame_threshold: usize,

    /// Longest wait for a single evaluator call.
    pub evaluator_timeout: Duration,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 20_000,
            time_budget: Some(Duration::from_millis(200)),
            c_puct: 1.4,
            virtual_loss: 1.0,
            rollout: RolloutKind::Heavy,
            rollout_depth: 40,
            heavy_temperature: 1.0,
            dirichlet_alpha: 0.3,
            dirichlet_epsilon: 0.0,
            seed: 0,
            endgame_threshold: 6,
            evaluator_timeout: Duration::from_millis(50),
        }
    }
}

impl MctsConfig {
    /// Create a fast, iteration-bounded config for testing.
    pub fn for_testing() -> Self {
        Self {
            iterations: 200,
            time_budget: None,
            c_puct: 1.4,
            virtual_loss: 1.0,
            rollout: RolloutKind::Random,
            rollout_depth: 20,
            heavy_temperature: 1.0,
            dirichlet_alpha: 0.0,
            dirichlet_epsilon: 0.0,
            seed: 7,
            endgame_threshold: 0,
            evaluator_timeout: Duration::from_millis(50),
        }
    }

    /// Builder pattern: set the iteration cap.
    pub fn with_iterations(mut self, n: u32) -> Self {
        self.iterations = n;
        self
    }

    /// Builder pattern: set the time budget.
    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    /// Builder pattern: set c_puct exploration constant.
    pub fn with_c_puct(mut self, c: f32) -> Self {
        self.c_puct = c;
        self
    }

    /// Builder pattern: set the rollout policy.
    pub fn with_rollout(mut self, rollout: RolloutKind) -> Self {
        self.rollout = rollout;
        self
    }

    /// Builder pattern: set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder pattern: set the endgame threshold.
    pub fn with_endgame_threshold(mut self, threshold: usize) -> Self {
        self.endgame_threshold = threshold;
        self
    }

    /// Builder pattern: set root Dirichlet noise.
    pub fn with_dirichlet(mut self, alpha: f32, epsilon: f32) -> Self {
        self.dirichlet_alpha = alpha;
        self.dirichlet_epsilon = epsilon;
        self
    }

    /// Builder pattern: set the evaluator timeout.
    pub fn with_evaluator_timeout(mut self, timeout: Duration) -> Self {
        self.evaluator_timeout = timeout;
        self
    }

    pub fn noise_enabled(&self) -> bool {
        self.dirichlet_alpha > 0.0 && self.dirichlet_epsilon > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.iterations, 20_000);
        assert!((config.c_puct - 1.4).abs() < 1e-6);
        assert_eq!(config.rollout, RolloutKind::Heavy);
        assert!(!config.noise_enabled());
    }

    #[test]
    fn test_builder_pattern() {
        let config = MctsConfig::default()
            .with_iterations(100)
            .with_rollout(RolloutKind::External)
            .with_dirichlet(0.3, 0.25);

        assert_eq!(config.iterations, 100);
        assert_eq!(config.rollout, RolloutKind::External);
        assert!(config.noise_enabled());
    }

    #[test]
    fn test_rollout_kind_parsing() {
        assert_eq!("random".parse::<RolloutKind>(), Ok(RolloutKind::Random));
        assert_eq!(" Heavy ".parse::<RolloutKind>(), Ok(RolloutKind::Heavy));
        assert_eq!("external".parse::<RolloutKind>(), Ok(RolloutKind::External));
        assert!("greedy".parse::<RolloutKind>().is_err());
        assert_eq!(RolloutKind::Heavy.to_string(), "heavy");
    }
}
