//! One self-play game: exact seat against hint seats.

use anyhow::{Context, Result};
use engine_core::{Completion, Position};
use engine_search::Engine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::config::Config;

/// Per-game settings, detached from the CLI config so a game can run on a
/// blocking worker.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub agents: usize,
    pub seed: u64,
    pub exact_depth: u32,
    pub exact_budget: Option<Duration>,
    pub hint_budget: Option<Duration>,
    pub hint_iterations: u32,
    pub max_plies: u32,
}

impl From<&Config> for MatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            agents: config.agents,
            seed: config.seed,
            exact_depth: config.exact_depth,
            exact_budget: config.exact_budget(),
            hint_budget: config.hint_budget(),
            hint_iterations: config.hint_iterations,
            max_plies: config.max_plies,
        }
    }
}

/// Search effort spent by one mode during a game.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModeTally {
    pub searches: u32,
    /// Searches cut short by their deadline.
    pub partial: u32,
    pub time: Duration,
}

impl ModeTally {
    fn record(&mut self, completion: Completion, elapsed: Duration) {
        self.searches += 1;
        if !completion.is_complete() {
            self.partial += 1;
        }
        self.time += elapsed;
    }
}

/// Outcome of one game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub seed: u64,
    pub exact_seat: usize,
    pub plies: u32,
    pub scores: Vec<i32>,
    /// False when the game was abandoned at the ply limit or by shutdown.
    pub finished: bool,
    pub exact: ModeTally,
    pub hint: ModeTally,
}

impl GameRecord {
    /// Sole top scorer, `None` on a shared top score.
    pub fn winner(&self) -> Option<usize> {
        let best = *self.scores.iter().max()?;
        let mut leaders = self.scores.iter().enumerate().filter(|(_, &s)| s == best);
        match (leaders.next(), leaders.next()) {
            (Some((seat, _)), None) => Some(seat),
            _ => None,
        }
    }
}

/// Play game number `index`. Seat `index % agents` searches exactly.
pub fn play_game(
    engine: &Engine,
    settings: &MatchSettings,
    index: u64,
    shutdown: &AtomicBool,
) -> Result<GameRecord> {
    let seed = settings.seed.wrapping_add(index);
    let exact_seat = (index % settings.agents as u64) as usize;
    let mut pos = Position::new(settings.agents, seed)
        .with_context(|| format!("failed to set up game with seed {}", seed))?;

    let mut exact = ModeTally::default();
    let mut hint = ModeTally::default();
    let mut plies = 0;

    while !pos.is_terminal() && plies < settings.max_plies {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let agent = pos.to_move();
        let start = Instant::now();
        let mv = if agent == exact_seat {
            let result = engine
                .search_exact(&pos, agent, settings.exact_depth, settings.exact_budget)
                .with_context(|| format!("exact search failed at ply {}", plies))?;
            exact.record(result.completion, start.elapsed());
            trace!(ply = plies, agent, depth = result.depth, score = result.score, "Exact move {}", result.best_move);
            result.best_move
        } else {
            let result = engine
                .search_hint(&pos, agent, settings.hint_budget, settings.hint_iterations)
                .with_context(|| format!("hint search failed at ply {}", plies))?;
            hint.record(result.completion, start.elapsed());
            trace!(
                ply = plies,
                agent,
                iterations = result.iterations,
                value = result.estimated_value,
                "Hint move {}",
                result.best_move
            );
            result.best_move
        };
        pos.play(mv)?;
        plies += 1;
    }

    let scores: Vec<i32> = (0..settings.agents).map(|agent| pos.score(agent)).collect();
    debug!(seed, exact_seat, plies, ?scores, finished = pos.is_terminal(), "Game over");
    Ok(GameRecord {
        seed,
        exact_seat,
        plies,
        scores,
        finished: pos.is_terminal(),
        exact,
        hint,
    })
}
