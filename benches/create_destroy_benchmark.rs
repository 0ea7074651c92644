use criterion::{Criterion, criterion_group, criterion_main};
use ecs_registry::component::Component;
use ecs_registry::entity::Entity;
use ecs_registry::entity_storage::EntityStorage;
use ecs_registry::registry::Registry;

#[derive(Component, Clone)]
struct Health(#[allow(dead_code)] i32);

fn benchmark_registry_create_destroy_1000(c: &mut Criterion) {
    let mut registry = Registry::new();

    // Prewarm
    {
        let entities: Vec<Entity> = (0..1000).map(|_| registry.create()).collect();
        registry.destroy_many(&entities);
    }

    c.bench_function("registry_create_destroy_1000", |b| {
        b.iter(|| {
            let mut entities = Vec::with_capacity(1000);

            for _ in 0..1000 {
                entities.push(registry.create());
            }

            registry.destroy_many(&entities);
        })
    });
}

fn benchmark_registry_create_emplace_destroy_1000(c: &mut Criterion) {
    let mut registry = Registry::new();

    c.bench_function("registry_create_emplace_destroy_1000", |b| {
        b.iter(|| {
            let mut entities = Vec::with_capacity(1000);

            for i in 0..1000 {
                let entity = registry.create();
                registry.emplace(entity, Health(i));
                entities.push(entity);
            }

            registry.destroy_many(&entities);
        })
    });
}

fn benchmark_entity_storage_create(c: &mut Criterion) {
    c.bench_function("entity_storage_create", |b| {
        b.iter(|| {
            let mut storage = EntityStorage::new();
            for _ in 0..1000 {
                storage.create();
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_registry_create_destroy_1000,
    benchmark_registry_create_emplace_destroy_1000,
    benchmark_entity_storage_create
);
criterion_main!(benches);
