use criterion::{Criterion, criterion_group, criterion_main};
use ecs_registry::component::Component;
use ecs_registry::entity::Entity;
use ecs_registry::registry::Registry;
use std::hint::black_box;

#[derive(Component, Clone)]
struct ComponentA {
    value: i32,
}

#[derive(Component, Clone)]
struct ComponentB {
    value: i32,
}

#[derive(Component, Clone)]
struct ComponentC;

fn populated_registry() -> Registry {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..10000).map(|_| registry.create()).collect();

    // A on every entity, B on half of them, C on every tenth
    registry.insert(&entities, ComponentA { value: 10 });
    for (i, &entity) in entities.iter().enumerate() {
        if i % 2 == 0 {
            registry.emplace(entity, ComponentB { value: 1 });
        }
        if i % 10 == 0 {
            registry.emplace(entity, ComponentC);
        }
    }

    registry
}

fn benchmark_view_single(c: &mut Criterion) {
    let mut registry = populated_registry();
    let view = registry.view::<ComponentA>();

    c.bench_function("view_single_10k", |b| {
        b.iter(|| {
            let mut sum = 0;
            view.each(|_, a| sum += a.value);
            black_box(sum)
        })
    });
}

fn benchmark_view_pair(c: &mut Criterion) {
    let mut registry = populated_registry();
    let view = registry.view::<(ComponentA, ComponentB)>();

    c.bench_function("view_pair_10k", |b| {
        b.iter(|| {
            view.each(|_, (a, b)| a.value += b.value);
        })
    });
}

fn benchmark_view_excluding(c: &mut Criterion) {
    let mut registry = populated_registry();
    let view = registry.view_excluding::<ComponentA, ComponentC>();

    c.bench_function("view_excluding_10k", |b| {
        b.iter(|| black_box(view.iter().count()))
    });
}

criterion_group!(
    benches,
    benchmark_view_single,
    benchmark_view_pair,
    benchmark_view_excluding
);
criterion_main!(benches);
