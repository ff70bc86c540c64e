//! # View Benchmark
//!
//! Iteration cost of single-component pools against persistent groups,
//! with handle unpacking and the lending `each` cursor.
//!
//! Run with: `cargo bench --package tessera`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera::{Ecs, EntityManager};

#[derive(Clone, Copy)]
struct Position(f32, f32);
#[derive(Clone, Copy)]
struct Velocity(f32, f32);
#[derive(Clone, Copy)]
struct Health(u32);

/// Every entity gets a Position, every other a Velocity, every fourth a Health.
fn populate(entities: &mut EntityManager, count: usize) {
    for i in 0..count {
        let e = entities.create();
        e.assign(entities, Position(0.0, 0.0));
        if i % 2 == 0 {
            e.assign(entities, Velocity(1.0, 1.0));
        }
        if i % 4 == 0 {
            e.assign(entities, Health(100));
        }
    }
}

fn bench_single_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_view");
    for count in [1_000, 100_000] {
        let mut ecs = Ecs::new();
        populate(&mut ecs.entities, count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(ecs.entities.entities_with_components::<(Position,)>().count()));
        });
    }
    group.finish();
}

fn bench_persistent_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistent_view");
    for count in [1_000, 100_000] {
        let mut ecs = Ecs::new();
        populate(&mut ecs.entities, count);
        let view = ecs.entities.view::<(Position, Velocity, Health)>();
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(view.iter(&ecs.entities).count()));
        });
    }
    group.finish();
}

fn bench_each_integrate(c: &mut Criterion) {
    let mut ecs = Ecs::new();
    populate(&mut ecs.entities, 100_000);

    c.bench_function("each_integrate_100k", |b| {
        b.iter(|| {
            ecs.entities
                .each::<(Position, Velocity), _>(|entities, _, (position, velocity)| {
                    let Ok(v) = velocity.get(entities).copied() else {
                        return;
                    };
                    if let Ok(p) = position.get_mut(entities) {
                        p.0 += v.0;
                        p.1 += v.1;
                    }
                });
        });
    });
}

criterion_group!(benches, bench_single_view, bench_persistent_view, bench_each_integrate);
criterion_main!(benches);
