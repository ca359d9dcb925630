//! Alpha-beta search configuration.

use std::time::Duration;

/// Configuration for exact-mode search.
#[derive(Debug, Clone)]
pub struct AlphaBetaConfig {
    /// Deepest iteration of iterative deepening, in plies.
    pub max_depth: u32,

    /// Wall-clock budget for the whole search. `None` searches every depth
    /// up to `max_depth`.
    pub time_budget: Option<Duration>,

    /// Treat the end of the current round as the horizon. Positions after
    /// the round closes are scored statically instead of searched.
    pub stop_at_round_end: bool,

    /// Hand nodes with fewer than this many draftable tiles to the endgame
    /// solver. 0 disables the solver. Only used with `stop_at_round_end`,
    /// since the solver stops at the same boundary.
    pub endgame_threshold: usize,

    /// Byte budget of the transposition table built when no cache is
    /// injected.
    pub tt_size_mb: usize,
}

impl Default for AlphaBetaConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            time_budget: Some(Duration::from_secs(3)),
            stop_at_round_end: true,
            endgame_threshold: 6,
            tt_size_mb: 64,
        }
    }
}

impl AlphaBetaConfig {
    /// Create a small, unbounded-time config for testing.
    pub fn for_testing() -> Self {
        Self {
            max_depth: 3,
            time_budget: None,
            stop_at_round_end: true,
            endgame_threshold: 0,
            tt_size_mb: 1,
        }
    }

    /// Builder pattern: set maximum depth.
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder pattern: set the time budget.
    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    /// Builder pattern: set the endgame threshold (0 disables the solver).
    pub fn with_endgame_threshold(mut self, threshold: usize) -> Self {
        self.endgame_threshold = threshold;
        self
    }

    /// Builder pattern: set the round-end horizon.
    pub fn with_stop_at_round_end(mut self, stop: bool) -> Self {
        self.stop_at_round_end = stop;
        self
    }

    /// Builder pattern: set the transposition table size.
    pub fn with_tt_size_mb(mut self, mb: usize) -> Self {
        self.tt_size_mb = mb;
        self
    }

    /// Whether nodes may be handed to the endgame solver.
    pub fn solver_enabled(&self) -> bool {
        self.endgame_threshold > 0 && self.stop_at_round_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AlphaBetaConfig::default();
        assert_eq!(config.max_depth, 6);
        assert!(config.solver_enabled());
    }

    #[test]
    fn test_builder_pattern() {
        let config = AlphaBetaConfig::for_testing()
            .with_max_depth(5)
            .with_endgame_threshold(4)
            .with_stop_at_round_end(false);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.endgame_threshold, 4);
        assert!(!config.solver_enabled());
    }
}
