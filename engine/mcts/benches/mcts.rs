//! MCTS benchmarks for performance profiling.
//!
//! Run with: `cargo bench -p mcts`
//!
//! These benchmarks measure:
//! - Full MCTS search with varying iteration counts
//! - Rollout policy comparison
//! - Tree operations (selection, backpropagation)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use engine_core::{legal_moves, Position};
use mcts::{run_mcts, MctsConfig, MctsTree, NodeId, RolloutKind};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Position reached by `plies` random moves from a seeded opening.
fn midgame(agents: usize, seed: u64, plies: usize) -> Position {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut pos = Position::new(agents, seed).unwrap();
    for _ in 0..plies {
        let moves = legal_moves(&pos);
        pos.play(*moves.choose(&mut rng).unwrap()).unwrap();
    }
    pos
}

fn bench_mcts_iterations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_iterations");
    let pos = Position::new(2, 42).unwrap();

    for iterations in [100u32, 400, 1600] {
        group.throughput(Throughput::Elements(iterations as u64));
        group.bench_with_input(BenchmarkId::new("opening_2p", iterations), &iterations, |b, &iterations| {
            let config = MctsConfig::for_testing().with_iterations(iterations);
            b.iter(|| black_box(run_mcts(&pos, 0, config.clone(), None).unwrap()));
        });
    }

    group.finish();
}

fn bench_rollout_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_rollout_policy");
    let pos = midgame(3, 7, 4);
    let agent = pos.to_move();

    for rollout in [RolloutKind::Random, RolloutKind::Heavy] {
        group.bench_function(rollout.to_string(), |b| {
            let config = MctsConfig::for_testing().with_iterations(200).with_rollout(rollout);
            b.iter(|| black_box(run_mcts(&pos, agent, config.clone(), None).unwrap()));
        });
    }

    group.finish();
}

fn bench_tree_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_operations");
    let pos = Position::new(4, 1).unwrap();
    let moves = legal_moves(&pos);

    group.bench_function("select_child", |b| {
        let mut tree = MctsTree::new(pos.clone(), 0);
        for (i, &mv) in moves.iter().enumerate() {
            let id = tree.add_child(tree.root(), mv, 1.0 / moves.len() as f32);
            tree.get_mut(id).visit_count = i as u32;
            tree.get_mut(id).value_sum = (i % 3) as f32 * 0.1;
        }
        tree.get_mut(tree.root()).visit_count = 1000;
        b.iter(|| black_box(tree.select_child(tree.root(), 1.4)));
    });

    group.bench_function("backpropagate_depth_8", |b| {
        let mut tree = MctsTree::new(pos.clone(), 0);
        let mut leaf = tree.root();
        for &mv in moves.iter().take(8) {
            leaf = tree.add_child(leaf, mv, 1.0);
        }
        let leaf: NodeId = leaf;
        b.iter(|| tree.backpropagate(black_box(leaf), 0.5, 0.0));
    });

    group.finish();
}

criterion_group!(benches, bench_mcts_iterations, bench_rollout_policies, bench_tree_operations);

criterion_main!(benches);
