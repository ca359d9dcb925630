//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::Path;
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",      // Current directory
    "../config.toml",   // Parent directory (when running from subdirectory)
    "/app/config.toml", // Docker container
];

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "TESSERA_CONFIG";

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by TESSERA_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
/// 4. Docker container path (/app/config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    // Check for explicit config path
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = Path::new(&path);
        if path.exists() {
            info!("Loading config from {}: {}", CONFIG_ENV_VAR, path.display());
            return load_from_path(path);
        }
        warn!(
            "{}={} not found, searching defaults",
            CONFIG_ENV_VAR,
            path.display()
        );
    }

    // Search default locations
    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(path);
        }
    }

    // Fall back to defaults
    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, u64, f64, bool, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(raw) = std::env::var($key) {
            match raw.parse() {
                Ok(v) => $config.$section.$field = v,
                Err(_) => warn!("Ignoring {}={}: not a valid value", $key, raw),
            }
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: TESSERA_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.log_level, "TESSERA_COMMON_LOG_LEVEL");

    // Search
    env_override!(
        config,
        search.max_depth,
        "TESSERA_SEARCH_MAX_DEPTH",
        parse
    );
    env_override!(
        config,
        search.time_budget_ms,
        "TESSERA_SEARCH_TIME_BUDGET_MS",
        parse
    );
    env_override!(
        config,
        search.stop_at_round_end,
        "TESSERA_SEARCH_STOP_AT_ROUND_END",
        parse
    );

    // Transposition
    env_override!(
        config,
        transposition.size_mb,
        "TESSERA_TRANSPOSITION_SIZE_MB",
        parse
    );

    // MCTS
    env_override!(config, mcts.iterations, "TESSERA_MCTS_ITERATIONS", parse);
    env_override!(
        config,
        mcts.time_budget_ms,
        "TESSERA_MCTS_TIME_BUDGET_MS",
        parse
    );
    env_override!(config, mcts.c_puct, "TESSERA_MCTS_C_PUCT", parse);
    env_override!(
        config,
        mcts.virtual_loss,
        "TESSERA_MCTS_VIRTUAL_LOSS",
        parse
    );
    env_override!(
        config,
        mcts.rollout_policy,
        "TESSERA_MCTS_ROLLOUT_POLICY"
    );
    env_override!(
        config,
        mcts.rollout_depth,
        "TESSERA_MCTS_ROLLOUT_DEPTH",
        parse
    );
    env_override!(
        config,
        mcts.heavy_temperature,
        "TESSERA_MCTS_HEAVY_TEMPERATURE",
        parse
    );
    env_override!(
        config,
        mcts.dirichlet_alpha,
        "TESSERA_MCTS_DIRICHLET_ALPHA",
        parse
    );
    env_override!(
        config,
        mcts.dirichlet_epsilon,
        "TESSERA_MCTS_DIRICHLET_EPSILON",
        parse
    );
    env_override!(config, mcts.seed, "TESSERA_MCTS_SEED", parse);
    env_override!(
        config,
        mcts.evaluator_timeout_ms,
        "TESSERA_MCTS_EVALUATOR_TIMEOUT_MS",
        parse
    );

    // Endgame
    env_override!(config, endgame.enabled, "TESSERA_ENDGAME_ENABLED", parse);
    env_override!(
        config,
        endgame.threshold,
        "TESSERA_ENDGAME_THRESHOLD",
        parse
    );

    // Actor
    env_override!(config, actor.games, "TESSERA_ACTOR_GAMES", parse);
    env_override!(config, actor.agents, "TESSERA_ACTOR_AGENTS", parse);
    env_override!(config, actor.seed, "TESSERA_ACTOR_SEED", parse);
    env_override!(
        config,
        actor.log_interval,
        "TESSERA_ACTOR_LOG_INTERVAL",
        parse
    );
    env_override!(config, actor.max_plies, "TESSERA_ACTOR_MAX_PLIES", parse);

    config
}
