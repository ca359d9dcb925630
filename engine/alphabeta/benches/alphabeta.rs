//! Alpha-beta benchmarks.
//!
//! Run with: `cargo bench -p alphabeta`

use alphabeta::{search, AlphaBetaConfig, Bound, TranspositionCache, TranspositionTable, TtEntry};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use engine_core::{legal_moves, Position};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Position after `plies` random moves.
fn midgame(agents: usize, seed: u64, plies: usize) -> Position {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut pos = Position::new(agents, seed).unwrap();
    for _ in 0..plies {
        let moves = legal_moves(&pos);
        pos.play(*moves.choose(&mut rng).unwrap()).unwrap();
    }
    pos
}

fn bench_search_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("alphabeta_depth");
    group.sample_size(10);

    for depth in [1u32, 2, 3, 4] {
        group.bench_with_input(BenchmarkId::new("opening_2p", depth), &depth, |b, &depth| {
            let pos = Position::new(2, 42).unwrap();
            let config = AlphaBetaConfig::for_testing().with_max_depth(depth);
            b.iter(|| black_box(search(&pos, 0, &config, None).unwrap()));
        });
    }

    for agents in [2usize, 3, 4] {
        group.bench_with_input(BenchmarkId::new("midgame_depth3", agents), &agents, |b, &agents| {
            let pos = midgame(agents, 7, 4);
            let config = AlphaBetaConfig::for_testing().with_max_depth(3);
            b.iter(|| black_box(search(&pos, pos.to_move(), &config, None).unwrap()));
        });
    }

    group.finish();
}

fn bench_endgame_deferral(c: &mut Criterion) {
    let mut group = c.benchmark_group("alphabeta_endgame");
    group.sample_size(10);

    let pos = midgame(2, 3, 12);
    for threshold in [0usize, 6, 10] {
        group.bench_with_input(BenchmarkId::new("threshold", threshold), &threshold, |b, &t| {
            let config = AlphaBetaConfig::for_testing()
                .with_max_depth(6)
                .with_endgame_threshold(t);
            b.iter(|| black_box(search(&pos, pos.to_move(), &config, None).unwrap()));
        });
    }

    group.finish();
}

fn bench_tt(c: &mut Criterion) {
    let mut group = c.benchmark_group("transposition_table");
    let tt = TranspositionTable::new(16);
    let entry = TtEntry {
        depth: 4,
        score: 120,
        bound: Bound::Exact,
        best_move: None,
    };

    group.bench_function("store_probe", |b| {
        let mut key = 0x1234_5678_9ABC_DEF0u64;
        b.iter(|| {
            key = key.wrapping_mul(6364136223846793005).wrapping_add(1);
            tt.store(key, entry);
            black_box(tt.probe(key))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_search_depth, bench_endgame_deferral, bench_tt);
criterion_main!(benches);
