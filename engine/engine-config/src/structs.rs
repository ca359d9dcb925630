//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_max_depth() -> u32 {
    defaults::max_depth()
}
fn d_search_budget() -> u64 {
    defaults::search_time_budget_ms()
}
fn d_stop_at_round_end() -> bool {
    defaults::stop_at_round_end()
}
fn d_tt_size_mb() -> usize {
    defaults::tt_size_mb()
}
fn d_iterations() -> u32 {
    defaults::mcts_iterations()
}
fn d_mcts_budget() -> u64 {
    defaults::mcts_time_budget_ms()
}
fn d_c_puct() -> f64 {
    defaults::c_puct()
}
fn d_virtual_loss() -> f64 {
    defaults::virtual_loss()
}
fn d_rollout_policy() -> String {
    defaults::rollout_policy().into()
}
fn d_rollout_depth() -> u32 {
    defaults::rollout_depth()
}
fn d_heavy_temperature() -> f64 {
    defaults::heavy_temperature()
}
fn d_dirichlet_alpha() -> f64 {
    defaults::dirichlet_alpha()
}
fn d_dirichlet_epsilon() -> f64 {
    defaults::dirichlet_epsilon()
}
fn d_mcts_seed() -> u64 {
    defaults::mcts_seed()
}
fn d_evaluator_timeout() -> u64 {
    defaults::evaluator_timeout_ms()
}
fn d_endgame_enabled() -> bool {
    defaults::endgame_enabled()
}
fn d_endgame_threshold() -> usize {
    defaults::endgame_threshold()
}
fn d_games() -> u32 {
    defaults::games()
}
fn d_agents() -> usize {
    defaults::agents()
}
fn d_actor_seed() -> u64 {
    defaults::actor_seed()
}
fn d_log_interval() -> u32 {
    defaults::log_interval()
}
fn d_max_plies() -> u32 {
    defaults::max_plies()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub transposition: TranspositionConfig,
    #[serde(default)]
    pub mcts: MctsConfig,
    #[serde(default)]
    pub endgame: EndgameConfig,
    #[serde(default)]
    pub actor: ActorConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level().into(),
        }
    }
}

/// Exact-mode (alpha-beta) search configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(default = "d_max_depth")]
    pub max_depth: u32,
    #[serde(default = "d_search_budget")]
    pub time_budget_ms: u64,
    /// Stop the tree at the end of the current round instead of guessing
    /// the refill
    #[serde(default = "d_stop_at_round_end")]
    pub stop_at_round_end: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: defaults::max_depth(),
            time_budget_ms: defaults::search_time_budget_ms(),
            stop_at_round_end: defaults::stop_at_round_end(),
        }
    }
}

/// Transposition table sizing
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TranspositionConfig {
    #[serde(default = "d_tt_size_mb")]
    pub size_mb: usize,
}

impl Default for TranspositionConfig {
    fn default() -> Self {
        Self {
            size_mb: defaults::tt_size_mb(),
        }
    }
}

/// Hint-mode (MCTS) configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MctsConfig {
    #[serde(default = "d_iterations")]
    pub iterations: u32,
    #[serde(default = "d_mcts_budget")]
    pub time_budget_ms: u64,
    #[serde(default = "d_c_puct")]
    pub c_puct: f64,
    #[serde(default = "d_virtual_loss")]
    pub virtual_loss: f64,
    /// "random", "heavy" or "external"
    #[serde(default = "d_rollout_policy")]
    pub rollout_policy: String,
    #[serde(default = "d_rollout_depth")]
    pub rollout_depth: u32,
    #[serde(default = "d_heavy_temperature")]
    pub heavy_temperature: f64,
    #[serde(default = "d_dirichlet_alpha")]
    pub dirichlet_alpha: f64,
    #[serde(default = "d_dirichlet_epsilon")]
    pub dirichlet_epsilon: f64,
    #[serde(default = "d_mcts_seed")]
    pub seed: u64,
    #[serde(default = "d_evaluator_timeout")]
    pub evaluator_timeout_ms: u64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: defaults::mcts_iterations(),
            time_budget_ms: defaults::mcts_time_budget_ms(),
            c_puct: defaults::c_puct(),
            virtual_loss: defaults::virtual_loss(),
            rollout_policy: defaults::rollout_policy().into(),
            rollout_depth: defaults::rollout_depth(),
            heavy_temperature: defaults::heavy_temperature(),
            dirichlet_alpha: defaults::dirichlet_alpha(),
            dirichlet_epsilon: defaults::dirichlet_epsilon(),
            seed: defaults::mcts_seed(),
            evaluator_timeout_ms: defaults::evaluator_timeout_ms(),
        }
    }
}

/// Endgame solver configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EndgameConfig {
    #[serde(default = "d_endgame_enabled")]
    pub enabled: bool,
    /// Solve exhaustively once fewer than this many tiles remain to draft
    #[serde(default = "d_endgame_threshold")]
    pub threshold: usize,
}

impl Default for EndgameConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::endgame_enabled(),
            threshold: defaults::endgame_threshold(),
        }
    }
}

/// Self-play runner configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ActorConfig {
    #[serde(default = "d_games")]
    pub games: u32,
    #[serde(default = "d_agents")]
    pub agents: usize,
    #[serde(default = "d_actor_seed")]
    pub seed: u64,
    #[serde(default = "d_log_interval")]
    pub log_interval: u32,
    /// Abandon a game that runs longer than this
    #[serde(default = "d_max_plies")]
    pub max_plies: u32,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            games: defaults::games(),
            agents: defaults::agents(),
            seed: defaults::actor_seed(),
            log_interval: defaults::log_interval(),
            max_plies: defaults::max_plies(),
        }
    }
}
