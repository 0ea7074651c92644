use criterion::{Criterion, criterion_group, criterion_main};
use ecs_registry::component::Component;
use ecs_registry::entity::Entity;
use ecs_registry::registry::Registry;

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

fn spawn(registry: &mut Registry, count: usize) -> Vec<Entity> {
    let entities: Vec<Entity> = (0..count).map(|_| registry.create()).collect();

    registry.insert(&entities, ComponentA { value: 10 });
    for (i, &entity) in entities.iter().enumerate() {
        if i % 2 == 0 {
            registry.emplace(entity, ComponentB { value: 1 });
        }
    }

    entities
}

fn benchmark_owning_group_each(c: &mut Criterion) {
    let mut registry = Registry::new();
    let group = registry.group::<(ComponentA, ComponentB), (), ComponentC>();
    spawn(&mut registry, 10000);

    c.bench_function("owning_group_each_10k", |b| {
        b.iter(|| {
            group.each(|_, (a, b)| a.value += b.value);
        })
    });
}

fn benchmark_non_owning_group_each(c: &mut Criterion) {
    let mut registry = Registry::new();
    let group = registry.group::<(), (ComponentA, ComponentB), ComponentC>();
    spawn(&mut registry, 10000);

    c.bench_function("non_owning_group_each_10k", |b| {
        b.iter(|| {
            group.each(|_, (a, b)| a.value += b.value);
        })
    });
}

fn benchmark_group_maintenance(c: &mut Criterion) {
    let mut registry = Registry::new();
    let _group = registry.group::<(ComponentA, ComponentB), (), ComponentC>();
    let entities = spawn(&mut registry, 1000);

    // Toggling the excluded type moves members in and out of the group
    c.bench_function("owning_group_toggle_exclude_1000", |b| {
        b.iter(|| {
            registry.insert(&entities, ComponentC);
            registry.clear::<ComponentC>();
        })
    });
}

criterion_group!(
    benches,
    benchmark_owning_group_each,
    benchmark_non_owning_group_each,
    benchmark_group_maintenance
);
criterion_main!(benches);
