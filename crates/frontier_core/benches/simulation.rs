//! Simulation benchmarks for frontier_core.
//!
//! Run with: `cargo bench -p frontier_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use frontier_core::prelude::*;

const MAP_SIZE: u32 = 200;

/// Two players split a large map with a row of posts along the border.
fn border_front() -> Simulation {
    let config = GameConfig {
        spawn_phase_ticks: 0,
        defense_post_attack_rate: 10,
        ..GameConfig::default()
    };
    let mut game = Game::new(GameMap::new(MAP_SIZE, MAP_SIZE), config);
    let west = game.add_player("west", 100_000);
    let east = game.add_player("east", 100_000);
    for x in 0..MAP_SIZE {
        for y in 0..MAP_SIZE {
            let owner = if x < MAP_SIZE / 2 { west } else { east };
            let tile = game.map().ref_at(x, y);
            let _ = game.conquer(owner, tile);
        }
    }

    let mut sim = Simulation::new(game);
    sim.add_execution(Box::new(PlayerExecution::new(west)));
    sim.add_execution(Box::new(PlayerExecution::new(east)));
    for y in (0..MAP_SIZE).step_by(10) {
        let west_tile = sim.game().map().ref_at(MAP_SIZE / 2 - 3, y);
        let east_tile = sim.game().map().ref_at(MAP_SIZE / 2 + 2, y);
        sim.add_execution(Box::new(DefensePostExecution::new(west, west_tile)));
        sim.add_execution(Box::new(DefensePostExecution::new(east, east_tile)));
    }
    sim
}

/// Runs simulation benchmarks for the frontier_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("border_front_100_ticks", |b| {
        b.iter_batched(
            border_front,
            |mut sim| {
                for _ in 0..100 {
                    black_box(sim.tick());
                }
                sim.state_hash()
            },
            BatchSize::LargeInput,
        );
    });

    c.bench_function("state_hash_200x200", |b| {
        let sim = border_front();
        b.iter(|| black_box(sim.state_hash()));
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
