//! Search settings derived from the central configuration.

use alphabeta::AlphaBetaConfig;
use engine_config::CentralConfig;
use mcts::{MctsConfig, RolloutKind};
use std::time::Duration;
use tracing::warn;

/// Settings for both search modes.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub exact: AlphaBetaConfig,
    pub hint: MctsConfig,
}

impl Default for EngineConfig {
    /// Built-in defaults, without reading config.toml or the environment.
    fn default() -> Self {
        Self::from_central(&CentralConfig::default())
    }
}

impl EngineConfig {
    /// Convert the central configuration. An unknown rollout policy falls
    /// back to heavy; a disabled endgame solver sets both thresholds to 0.
    pub fn from_central(central: &CentralConfig) -> Self {
        let threshold = if central.endgame.enabled {
            central.endgame.threshold
        } else {
            0
        };

        let exact = AlphaBetaConfig::default()
            .with_max_depth(central.search.max_depth)
            .with_time_budget(budget(central.search.time_budget_ms))
            .with_stop_at_round_end(central.search.stop_at_round_end)
            .with_endgame_threshold(threshold)
            .with_tt_size_mb(central.transposition.size_mb);

        let rollout = central.mcts.rollout_policy.parse().unwrap_or_else(|e| {
            warn!("{}; using heavy", e);
            RolloutKind::Heavy
        });
        let mut hint = MctsConfig::default()
            .with_iterations(central.mcts.iterations)
            .with_time_budget(budget(central.mcts.time_budget_ms))
            .with_c_puct(central.mcts.c_puct as f32)
            .with_rollout(rollout)
            .with_seed(central.mcts.seed)
            .with_endgame_threshold(threshold)
            .with_dirichlet(
                central.mcts.dirichlet_alpha as f32,
                central.mcts.dirichlet_epsilon as f32,
            )
            .with_evaluator_timeout(Duration::from_millis(central.mcts.evaluator_timeout_ms));
        hint.virtual_loss = central.mcts.virtual_loss as f32;
        hint.rollout_depth = central.mcts.rollout_depth;
        hint.heavy_temperature = central.mcts.heavy_temperature as f32;

        Self { exact, hint }
    }

    /// Small, deterministic settings for tests.
    pub fn for_testing() -> Self {
        Self {
            exact: AlphaBetaConfig::for_testing(),
            hint: MctsConfig::for_testing(),
        }
    }

    pub fn with_exact(mut self, exact: AlphaBetaConfig) -> Self {
        self.exact = exact;
        self
    }

    pub fn with_hint(mut self, hint: MctsConfig) -> Self {
        self.hint = hint;
        self
    }
}

/// 0 ms means no wall-clock limit.
fn budget(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}
