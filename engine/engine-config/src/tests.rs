//! Tests for the configuration module.

use super::*;

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.log_level, "info");
    assert_eq!(config.search.max_depth, 6);
    assert_eq!(config.transposition.size_mb, 64);
    assert_eq!(config.mcts.iterations, 20000);
    assert!(config.endgame.enabled);
    assert_eq!(config.actor.agents, 2);
}

#[test]
fn test_search_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.search.time_budget_ms, 3000);
    assert!(config.search.stop_at_round_end);
}

#[test]
fn test_mcts_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.mcts.time_budget_ms, 200);
    assert!((config.mcts.c_puct - 1.4).abs() < f64::EPSILON);
    assert!((config.mcts.virtual_loss - 1.0).abs() < f64::EPSILON);
    assert_eq!(config.mcts.rollout_policy, "heavy");
    assert_eq!(config.mcts.rollout_depth, 40);
    assert!((config.mcts.heavy_temperature - 1.0).abs() < f64::EPSILON);
    assert!((config.mcts.dirichlet_alpha - 0.3).abs() < f64::EPSILON);
    assert_eq!(config.mcts.dirichlet_epsilon, 0.0);
    assert_eq!(config.mcts.seed, 0);
    assert_eq!(config.mcts.evaluator_timeout_ms, 50);
}

#[test]
fn test_endgame_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.endgame.threshold, 6);
}

#[test]
fn test_tessera_env_overrides() {
    std::env::set_var("TESSERA_SEARCH_MAX_DEPTH", "9");
    std::env::set_var("TESSERA_MCTS_ROLLOUT_POLICY", "random");
    std::env::set_var("TESSERA_ENDGAME_ENABLED", "false");
    std::env::set_var("TESSERA_TRANSPOSITION_SIZE_MB", "not-a-number");

    let config = load_config();
    assert_eq!(config.search.max_depth, 9);
    assert_eq!(config.mcts.rollout_policy, "random");
    assert!(!config.endgame.enabled);
    // Unparseable values leave the default in place
    assert_eq!(config.transposition.size_mb, 64);

    std::env::remove_var("TESSERA_SEARCH_MAX_DEPTH");
    std::env::remove_var("TESSERA_MCTS_ROLLOUT_POLICY");
    std::env::remove_var("TESSERA_ENDGAME_ENABLED");
    std::env::remove_var("TESSERA_TRANSPOSITION_SIZE_MB");
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
log_level = "debug"

[search]
max_depth = 4
time_budget_ms = 500

[mcts]
rollout_policy = "external"
c_puct = 2.0

[actor]
games = 3
agents = 4
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.log_level, "debug");
    assert_eq!(config.search.max_depth, 4);
    assert_eq!(config.search.time_budget_ms, 500);
    assert!(config.search.stop_at_round_end); // Default
    assert_eq!(config.mcts.rollout_policy, "external");
    assert!((config.mcts.c_puct - 2.0).abs() < f64::EPSILON);
    assert_eq!(config.actor.games, 3);
    assert_eq!(config.actor.agents, 4);
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[endgame]
threshold = 9
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.endgame.threshold, 9);
    assert!(config.endgame.enabled); // Default
    assert_eq!(config.common.log_level, "info"); // Default
    assert_eq!(config.mcts.iterations, 20000); // Default
}

#[test]
fn test_load_from_missing_path_uses_defaults() {
    let config = load_from_path(std::path::Path::new("/nonexistent/tessera.toml"));
    assert_eq!(config.transposition.size_mb, 64);
}

#[test]
fn test_config_clone() {
    let config = CentralConfig::default();
    let cloned = config.clone();
    assert_eq!(config.common.log_level, cloned.common.log_level);
    assert_eq!(config.mcts.rollout_policy, cloned.mcts.rollout_policy);
}
