//! Search benchmarks for performance profiling.
//!
//! Run with: `cargo bench -p mcts`
//!
//! These benchmarks measure:
//! - Simulation batches of varying size from the Corridors opening
//! - Rollout versus heuristic leaf evaluation, UCT versus PUCT
//! - Tree operations (move generation, sorted-actions reporting, root
//!   advancement)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use games_corridors::Board;
use mcts::{SearchConfig, SearchTree};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn rng() -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(42)
}

fn bench_simulation_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_batches");
    group.sample_size(10);

    for sims in [10, 50, 200] {
        group.throughput(Throughput::Elements(sims as u64));
        group.bench_with_input(BenchmarkId::new("rollout", sims), &sims, |b, &sims| {
            let config = SearchConfig::default();
            b.iter(|| {
                let mut tree = SearchTree::new(Board::default());
                let mut rng = rng();
                tree.simulate(sims, &mut rng, &config).unwrap();
                black_box(tree.visit_count())
            });
        });
    }

    group.finish();
}

fn bench_evaluation_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation_modes");
    group.sample_size(10);
    let sims = 100;

    group.bench_function("rollout_uct", |b| {
        let config = SearchConfig::default();
        b.iter(|| {
            let mut tree = SearchTree::new(Board::default());
            let mut rng = rng();
            tree.simulate(sims, &mut rng, &config).unwrap();
            black_box(tree.visit_count())
        });
    });

    group.bench_function("heuristic_puct_probs", |b| {
        let mut config = SearchConfig::default().with_puct(true).with_rollout(false);
        config.use_probs = true;
        b.iter(|| {
            let mut tree = SearchTree::new(Board::default());
            let mut rng = rng();
            tree.simulate(sims, &mut rng, &config).unwrap();
            black_box(tree.visit_count())
        });
    });

    group.finish();
}

fn bench_tree_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_ops");

    group.bench_function("opening_move_generation", |b| {
        let board = Board::default();
        b.iter(|| {
            let mut moves = Vec::new();
            board.legal_moves(&mut moves);
            black_box(moves.len())
        });
    });

    group.bench_function("sorted_actions", |b| {
        let config = SearchConfig::default();
        let mut tree = SearchTree::new(Board::default());
        let mut rng = rng();
        tree.simulate(200, &mut rng, &config).unwrap();
        b.iter(|| black_box(tree.sorted_actions(false).unwrap().len()));
    });

    group.bench_function("make_move_compaction", |b| {
        let config = SearchConfig::default();
        b.iter_batched(
            || {
                let mut tree = SearchTree::new(Board::default());
                let mut rng = rng();
                tree.simulate(100, &mut rng, &config).unwrap();
                tree
            },
            |mut tree| {
                tree.make_move(0).unwrap();
                black_box(tree.len())
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_simulation_batches,
    bench_evaluation_modes,
    bench_tree_operations,
);

criterion_main!(benches);
