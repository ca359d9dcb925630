//! Self-play loop driving the search engine

use anyhow::Result;
use engine_search::{Engine, EngineConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::config::{central, Config};
use crate::game::{play_game, MatchSettings};
use crate::stats::ActorStats;

pub struct Actor {
    config: Config,
    engine: Engine,
    stats: ActorStats,
    game_count: AtomicU32,
    shutdown_signal: Arc<AtomicBool>,
}

impl Actor {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_engine(config, Engine::new(EngineConfig::from_central(central())))
    }

    pub fn with_engine(config: Config, engine: Engine) -> Result<Self> {
        config.validate()?;
        let engine_config = engine.config();
        info!(
            agents = config.agents,
            exact_depth = config.exact_depth,
            exact_budget_ms = config.exact_budget_ms,
            hint_budget_ms = config.hint_budget_ms,
            hint_iterations = config.hint_iterations,
            rollout = %engine_config.hint.rollout,
            endgame_threshold = engine_config.exact.endgame_threshold,
            "Actor initialized"
        );

        Ok(Self {
            stats: ActorStats::new(config.agents),
            config,
            engine,
            game_count: AtomicU32::new(0),
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        })
    }

    pub async fn run(&self) -> Result<()> {
        info!(games = self.config.games, seed = self.config.seed, "Actor starting main loop");

        // Progress bar for bounded runs (only when stderr is a TTY)
        let progress = if self.config.games > 0 && std::io::IsTerminal::is_terminal(&std::io::stderr()) {
            let pb = ProgressBar::new(self.config.games as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} games ({eta})")?
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let settings = MatchSettings::from(&self.config);

        loop {
            if self.shutdown_signal.load(Ordering::Relaxed) {
                info!("Shutdown signal received, stopping actor");
                break;
            }

            let index = self.game_count.load(Ordering::Relaxed);
            if self.config.games > 0 && index >= self.config.games {
                info!("Reached game limit ({}), stopping", self.config.games);
                break;
            }

            // Searches are CPU-bound; keep them off the async workers.
            let engine = self.engine.clone();
            let game_settings = settings.clone();
            let shutdown = Arc::clone(&self.shutdown_signal);
            let game_start = Instant::now();
            let outcome = tokio::task::spawn_blocking(move || {
                play_game(&engine, &game_settings, index as u64, &shutdown)
            })
            .await?;
            let new_count = self.game_count.fetch_add(1, Ordering::Relaxed) + 1;

            match outcome {
                Ok(record) => {
                    self.stats.record_game(&record);
                    debug!(
                        game = new_count,
                        plies = record.plies,
                        duration = game_start.elapsed().as_secs_f64(),
                        "Game completed"
                    );

                    if let Some(ref pb) = progress {
                        pb.inc(1);
                    }

                    if self.config.log_interval > 0 && new_count % self.config.log_interval == 0 {
                        let log = || self.log_progress(new_count, &record.scores, record.exact_seat);
                        match progress {
                            Some(ref pb) => pb.suspend(log),
                            None => log(),
                        }
                        self.write_stats();
                    }
                }
                Err(e) => {
                    error!("Game {} failed: {:#}", new_count, e);
                }
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("done");
        }

        self.write_stats();
        let snapshot = self.stats.snapshot();
        info!(
            games = snapshot.games_completed,
            abandoned = snapshot.games_abandoned,
            exact_wins = snapshot.exact_wins,
            hint_wins = snapshot.hint_wins,
            ties = snapshot.ties,
            exact_avg_ms = format!("{:.1}", snapshot.exact.avg_search_ms),
            hint_avg_ms = format!("{:.1}", snapshot.hint.avg_search_ms),
            "Actor stopped"
        );
        Ok(())
    }

    fn log_progress(&self, count: u32, scores: &[i32], exact_seat: usize) {
        let snapshot = self.stats.snapshot();
        info!(
            "Completed {} games (last: scores {:?}, exact seat {}; exact {} / hint {} / ties {})",
            count, scores, exact_seat, snapshot.exact_wins, snapshot.hint_wins, snapshot.ties
        );
        info!(
            exact_searches = snapshot.exact.searches,
            exact_partial = snapshot.exact.partial,
            hint_searches = snapshot.hint.searches,
            hint_partial = snapshot.hint.partial,
            "Search deadline overruns"
        );
    }

    fn write_stats(&self) {
        if let Some(ref path) = self.config.stats_path {
            self.stats.write_stats(&PathBuf::from(path));
        }
    }

    pub fn shutdown(&self) {
        self.shutdown_signal.store(true, Ordering::Relaxed);
        info!("Shutdown signal set");
    }

    pub fn game_count(&self) -> u32 {
        self.game_count.load(Ordering::Relaxed)
    }
}
