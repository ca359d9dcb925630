//! Centralized configuration loading from config.toml.
//!
//! This crate provides configuration structs and loading logic shared
//! across the search crates and the actor binary.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`TESSERA_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! TESSERA_<SECTION>_<KEY>=value
//!
//! Examples:
//!     TESSERA_COMMON_LOG_LEVEL=debug
//!     TESSERA_SEARCH_MAX_DEPTH=8
//!     TESSERA_TRANSPOSITION_SIZE_MB=256
//!     TESSERA_MCTS_ROLLOUT_POLICY=random
//!     TESSERA_ENDGAME_THRESHOLD=8
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{
    apply_env_overrides, load_config, load_from_path, CONFIG_ENV_VAR, CONFIG_SEARCH_PATHS,
};
pub use structs::*;

#[cfg(test)]
mod tests;
