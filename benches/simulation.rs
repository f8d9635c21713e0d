//! Simulation benchmarks: trajectory discretization, settling a collapsed
//! tower, and a full turn cycle of ticks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use castle_bombard::game::ballistics::{discretize, Arc};
use castle_bombard::game::map::generate_terrain;
use castle_bombard::game::terrain::Material;
use castle_bombard::game::tick::tick;
use castle_bombard::{GameConfig, GridPos, SimState};

fn bench_discretize(c: &mut Criterion) {
    let config = GameConfig::spatial();
    let terrain = generate_terrain(&config);
    let muzzle = GridPos::new(9, 25, 4);
    let target = GridPos::new(40, 30, 2);
    let Some(arc) = Arc::solve(muzzle, target, config.width) else {
        return;
    };

    c.bench_function("discretize_spatial", |b| {
        b.iter(|| {
            discretize(
                black_box(&arc),
                0,
                &terrain,
                config.bomb_step_ms,
                config.trajectory_budget,
            )
        })
    });
}

fn bench_collapse(c: &mut Criterion) {
    let config = GameConfig::spatial();
    let mut floating = generate_terrain(&config);
    for x in 5..15 {
        for y in 20..30 {
            for z in 30..40 {
                floating.set(GridPos::new(x, y, z), Material::Stone1);
            }
        }
    }

    c.bench_function("collapse_to_stable", |b| {
        b.iter(|| {
            let mut terrain = floating.clone();
            let mut passes = 0;
            while terrain.collapse_pass() {
                passes += 1;
            }
            black_box(passes)
        })
    });
}

fn bench_turn_cycle(c: &mut Criterion) {
    let config = GameConfig::planar();

    c.bench_function("ticks_one_minute", |b| {
        b.iter(|| {
            let mut state = SimState::new(&config, 0);
            let mut now = 0;
            while now < 60_000 {
                now += 16;
                tick(&mut state, &config, now);
            }
            black_box(state.compute_hash())
        })
    });
}

criterion_group!(benches, bench_discretize, bench_collapse, bench_turn_cycle);
criterion_main!(benches);
