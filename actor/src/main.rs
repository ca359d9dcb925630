//! Actor - Self-play runner for Tessera
//!
//! A process that:
//! 1. Loads the central configuration and applies CLI overrides
//! 2. Plays games in which one seat uses exact search and the rest use hint search
//! 3. Logs per-mode outcomes and deadline overruns, optionally to a JSON file

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

mod actor;
mod config;
mod game;
mod stats;

use crate::actor::Actor;
use crate::config::Config;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    let games_description = if config.games == 0 {
        "unlimited".to_string()
    } else {
        config.games.to_string()
    };
    info!(games = config.games, "Actor will play {} games", games_description);

    let actor = Arc::new(Actor::new(config)?);

    // Setup graceful shutdown
    let shutdown_actor = Arc::clone(&actor);
    let shutdown_handle = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping actor...");
                shutdown_actor.shutdown();
            }
            Err(e) => error!("Failed to listen for ctrl+c: {}", e),
        }
    });

    let run_result = actor.run().await;
    shutdown_handle.abort();

    match run_result {
        Ok(()) => {
            info!("Actor completed successfully after {} games", actor.game_count());
            Ok(())
        }
        Err(e) => {
            error!("Actor failed: {}", e);
            Err(e)
        }
    }
}
