//! Configuration for the self-play runner
//!
//! Defaults come from the central config (config.toml plus `TESSERA_*`
//! environment overrides). CLI arguments take highest priority.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig};
use once_cell::sync::Lazy;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

pub fn central() -> &'static CentralConfig {
    &CENTRAL_CONFIG
}

fn default_games() -> u32 {
    CENTRAL_CONFIG.actor.games
}

fn default_agents() -> usize {
    CENTRAL_CONFIG.actor.agents
}

fn default_seed() -> u64 {
    CENTRAL_CONFIG.actor.seed
}

fn default_exact_depth() -> u32 {
    CENTRAL_CONFIG.search.max_depth
}

fn default_exact_budget() -> u64 {
    CENTRAL_CONFIG.search.time_budget_ms
}

fn default_hint_budget() -> u64 {
    CENTRAL_CONFIG.mcts.time_budget_ms
}

fn default_hint_iterations() -> u32 {
    CENTRAL_CONFIG.mcts.iterations
}

fn default_max_plies() -> u32 {
    CENTRAL_CONFIG.actor.max_plies
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_log_interval() -> u32 {
    CENTRAL_CONFIG.actor.log_interval
}

#[derive(Parser, Debug, Clone)]
#[command(name = "actor")]
#[command(about = "Tessera self-play runner")]
#[command(
    long_about = "Plays complete games in which one seat uses the exact alpha-beta search and
every other seat uses the MCTS hint search. The exact seat rotates from game
to game. Reports per-mode outcomes, timings and deadline overruns.

Configuration is loaded from config.toml with TESSERA_* environment variable
overrides. CLI arguments take highest priority."
)]
pub struct Config {
    /// Games to play (0 to play until interrupted)
    #[arg(long, default_value_t = default_games())]
    pub games: u32,

    /// Agents per game (2 to 4)
    #[arg(long, default_value_t = default_agents())]
    pub agents: usize,

    /// Seed of the first game; game `i` uses `seed + i`
    #[arg(long, default_value_t = default_seed())]
    pub seed: u64,

    /// Depth limit of the exact seat
    #[arg(long, default_value_t = default_exact_depth())]
    pub exact_depth: u32,

    /// Time budget per exact move in milliseconds (0 for none)
    #[arg(long, default_value_t = default_exact_budget())]
    pub exact_budget_ms: u64,

    /// Time budget per hint move in milliseconds (0 for none)
    #[arg(long, default_value_t = default_hint_budget())]
    pub hint_budget_ms: u64,

    /// Iteration cap per hint move
    #[arg(long, default_value_t = default_hint_iterations())]
    pub hint_iterations: u32,

    /// Abandon a game after this many plies
    #[arg(long, default_value_t = default_max_plies())]
    pub max_plies: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Log progress every N games (0 to disable)
    #[arg(long, default_value_t = default_log_interval())]
    pub log_interval: u32,

    /// Write a JSON stats summary to this file
    #[arg(long)]
    pub stats_path: Option<String>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(2..=4).contains(&self.agents) {
            return Err(anyhow!("agents must be between 2 and 4, got {}", self.agents));
        }

        if self.exact_depth == 0 {
            return Err(anyhow!("exact_depth must be greater than 0"));
        }

        if self.hint_iterations == 0 {
            return Err(anyhow!("hint_iterations must be greater than 0"));
        }

        if self.max_plies == 0 {
            return Err(anyhow!("max_plies must be greater than 0"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }

    pub fn exact_budget(&self) -> Option<Duration> {
        budget(self.exact_budget_ms)
    }

    pub fn hint_budget(&self) -> Option<Duration> {
        budget(self.hint_budget_ms)
    }
}

fn budget(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            games: 2,
            agents: 2,
            seed: 1,
            exact_depth: 2,
            exact_budget_ms: 500,
            hint_budget_ms: 0,
            hint_iterations: 50,
            max_plies: 400,
            log_level: "info".into(),
            log_interval: 1,
            stats_path: None,
        }
    }

    #[test]
    fn validate_accepts_valid_configuration() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_agent_count() {
        for agents in [0, 1, 5] {
            let mut cfg = base_config();
            cfg.agents = agents;
            let err = cfg.validate().unwrap_err();
            assert!(err.to_string().contains("agents"));
        }
    }

    #[test]
    fn validate_rejects_zero_depth() {
        let mut cfg = base_config();
        cfg.exact_depth = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("exact_depth"));
    }

    #[test]
    fn validate_rejects_zero_iterations() {
        let mut cfg = base_config();
        cfg.hint_iterations = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("hint_iterations"));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut cfg = base_config();
        cfg.log_level = "nope".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn budgets_treat_zero_as_unlimited() {
        let cfg = base_config();
        assert_eq!(cfg.exact_budget(), Some(Duration::from_millis(500)));
        assert_eq!(cfg.hint_budget(), None);
    }

    #[test]
    fn cli_overrides_defaults() {
        let cfg = Config::parse_from(["actor", "--games", "7", "--agents", "3", "--stats-path", "out.json"]);
        assert_eq!(cfg.games, 7);
        assert_eq!(cfg.agents, 3);
        assert_eq!(cfg.stats_path.as_deref(), Some("out.json"));
        assert_eq!(cfg.exact_depth, central().search.max_depth);
    }
}
