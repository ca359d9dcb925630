//! Self-play statistics tracking and persistence.
//!
//! This module tracks:
//! - Game counts and which mode won them
//! - Search counts, time and deadline overruns per mode
//!
//! A snapshot can be written to a JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

use crate::game::{GameRecord, ModeTally};

/// Per-mode counters.
#[derive(Debug, Default)]
struct ModeCounters {
    searches: AtomicU64,
    partial: AtomicU64,
    time_us: AtomicU64,
}

impl ModeCounters {
    fn add(&self, tally: &ModeTally) {
        self.searches.fetch_add(tally.searches as u64, Ordering::Relaxed);
        self.partial.fetch_add(tally.partial as u64, Ordering::Relaxed);
        self.time_us
            .fetch_add(tally.time.as_micros() as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ModeSnapshot {
        let searches = self.searches.load(Ordering::Relaxed);
        let time_us = self.time_us.load(Ordering::Relaxed);
        ModeSnapshot {
            searches,
            partial: self.partial.load(Ordering::Relaxed),
            avg_search_ms: if searches > 0 {
                time_us as f64 / searches as f64 / 1000.0
            } else {
                0.0
            },
        }
    }
}

/// Aggregated self-play statistics, designed for lock-free updates.
#[derive(Debug)]
pub struct ActorStats {
    games_completed: AtomicU32,
    /// Games stopped at the ply limit or by shutdown
    games_abandoned: AtomicU32,
    total_plies: AtomicU64,
    exact_wins: AtomicU32,
    hint_wins: AtomicU32,
    /// Shared top score
    ties: AtomicU32,
    exact: ModeCounters,
    hint: ModeCounters,
    start_time: Instant,
    agents: usize,
}

/// Serializable per-mode stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSnapshot {
    pub searches: u64,
    pub partial: u64,
    pub avg_search_ms: f64,
}

/// Serializable stats for JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActorStatsSnapshot {
    pub agents: usize,
    pub games_completed: u32,
    pub games_abandoned: u32,
    pub total_plies: u64,
    pub exact_wins: u32,
    pub hint_wins: u32,
    pub ties: u32,
    pub avg_game_length: f64,
    pub games_per_second: f64,
    pub runtime_seconds: f64,
    pub exact: ModeSnapshot,
    pub hint: ModeSnapshot,
    pub timestamp: u64,
}

impl ActorStats {
    pub fn new(agents: usize) -> Self {
        Self {
            games_completed: AtomicU32::new(0),
            games_abandoned: AtomicU32::new(0),
            total_plies: AtomicU64::new(0),
            exact_wins: AtomicU32::new(0),
            hint_wins: AtomicU32::new(0),
            ties: AtomicU32::new(0),
            exact: ModeCounters::default(),
            hint: ModeCounters::default(),
            start_time: Instant::now(),
            agents,
        }
    }

    /// Record a game. Abandoned games count toward search effort only.
    pub fn record_game(&self, record: &GameRecord) {
        self.exact.add(&record.exact);
        self.hint.add(&record.hint);

        if !record.finished {
            self.games_abandoned.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.games_completed.fetch_add(1, Ordering::Relaxed);
        self.total_plies
            .fetch_add(record.plies as u64, Ordering::Relaxed);
        match record.winner() {
            Some(seat) if seat == record.exact_seat => {
                self.exact_wins.fetch_add(1, Ordering::Relaxed);
            }
            Some(_) => {
                self.hint_wins.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.ties.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Get a snapshot of current stats.
    pub fn snapshot(&self) -> ActorStatsSnapshot {
        let games = self.games_completed.load(Ordering::Relaxed);
        let plies = self.total_plies.load(Ordering::Relaxed);
        let runtime = self.start_time.elapsed().as_secs_f64();

        let avg_game_length = if games > 0 {
            plies as f64 / games as f64
        } else {
            0.0
        };

        let games_per_second = if runtime > 0.0 {
            games as f64 / runtime
        } else {
            0.0
        };

        ActorStatsSnapshot {
            agents: self.agents,
            games_completed: games,
            games_abandoned: self.games_abandoned.load(Ordering::Relaxed),
            total_plies: plies,
            exact_wins: self.exact_wins.load(Ordering::Relaxed),
            hint_wins: self.hint_wins.load(Ordering::Relaxed),
            ties: self.ties.load(Ordering::Relaxed),
            avg_game_length,
            games_per_second,
            runtime_seconds: runtime,
            exact: self.exact.snapshot(),
            hint: self.hint.snapshot(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Write stats to a JSON file (atomic write-then-rename).
    pub fn write_stats(&self, path: &Path) {
        let snapshot = self.snapshot();

        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(j) => j,
            Err(e) => {
                warn!("Failed to serialize actor stats: {}", e);
                return;
            }
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!("Failed to create stats directory: {}", e);
                return;
            }
        }

        // Write to temp file then rename (atomic on most filesystems)
        let mut temp_path = PathBuf::from(path);
        temp_path.set_extension("json.tmp");
        match fs::File::create(&temp_path) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(json.as_bytes()) {
                    warn!("Failed to write actor stats: {}", e);
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to create temp stats file: {}", e);
                return;
            }
        }

        if let Err(e) = fs::rename(&temp_path, path) {
            warn!("Failed to rename stats file: {}", e);
            let _ = fs::remove_file(&temp_path);
            return;
        }

        debug!("Wrote actor stats to {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn record(exact_seat: usize, scores: Vec<i32>, finished: bool) -> GameRecord {
        GameRecord {
            seed: 0,
            exact_seat,
            plies: 40,
            scores,
            finished,
            exact: ModeTally {
                searches: 20,
                partial: 1,
                time: Duration::from_millis(200),
            },
            hint: ModeTally {
                searches: 20,
                partial: 20,
                time: Duration::from_millis(100),
            },
        }
    }

    #[test]
    fn test_record_outcomes() {
        let stats = ActorStats::new(2);
        stats.record_game(&record(0, vec![30, 20], true));
        stats.record_game(&record(1, vec![30, 20], true));
        stats.record_game(&record(0, vec![25, 25], true));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.games_completed, 3);
        assert_eq!(snapshot.exact_wins, 1);
        assert_eq!(snapshot.hint_wins, 1);
        assert_eq!(snapshot.ties, 1);
        assert_eq!(snapshot.total_plies, 120);
        assert!((snapshot.avg_game_length - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_abandoned_games_only_count_effort() {
        let stats = ActorStats::new(2);
        stats.record_game(&record(0, vec![5, 0], false));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.games_completed, 0);
        assert_eq!(snapshot.games_abandoned, 1);
        assert_eq!(snapshot.exact_wins, 0);
        assert_eq!(snapshot.exact.searches, 20);
        assert_eq!(snapshot.avg_game_length, 0.0);
    }

    #[test]
    fn test_mode_averages() {
        let stats = ActorStats::new(2);
        stats.record_game(&record(0, vec![1, 0], true));

        let snapshot = stats.snapshot();
        assert!((snapshot.exact.avg_search_ms - 10.0).abs() < 1e-6);
        assert!((snapshot.hint.avg_search_ms - 5.0).abs() < 1e-6);
        assert_eq!(snapshot.hint.partial, 20);
    }

    #[test]
    fn test_average_with_zero_games() {
        let snapshot = ActorStats::new(3).snapshot();
        assert_eq!(snapshot.games_completed, 0);
        assert_eq!(snapshot.avg_game_length, 0.0);
        assert_eq!(snapshot.exact.avg_search_ms, 0.0);
        assert!(!snapshot.exact.avg_search_ms.is_nan());
    }

    #[test]
    fn test_write_stats_atomic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("actor_stats.json");
        let stats = ActorStats::new(2);

        stats.record_game(&record(0, vec![30, 20], true));
        stats.write_stats(&path);
        let parsed: ActorStatsSnapshot = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.games_completed, 1);

        stats.record_game(&record(1, vec![30, 20], true));
        stats.write_stats(&path);
        let parsed: ActorStatsSnapshot = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.games_completed, 2);
        assert_eq!(parsed.hint_wins, 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(ActorStats::new(2));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record_game(&record(0, vec![3, 1], true));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.games_completed, 1000);
        assert_eq!(snapshot.exact_wins, 1000);
    }
}
